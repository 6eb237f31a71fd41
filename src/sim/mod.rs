//! Scheduler / step engine - the simulation's core state machine.
//!
//! # Design Principles
//! - All mutable simulation state lives in one owned [`SimulationContext`],
//!   constructed at process start and mutated only through `run_step`
//! - Cooldowns are the admission control: two-phase produce-then-consume
//!   ordering bounds collaborator call volume to at most
//!   (generators + analyzers) calls per step
//! - Steps are cooperative: one step runs to completion before the next

mod status;
mod step;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Timelike, Utc};

use crate::agents::AgentRuntime;
use crate::queue::QueueStore;

pub use status::{AgentPhase, AgentStatus};
pub use step::{StepEvent, StepSummary};

/// Tunable scheduling parameters.
#[derive(Debug, Clone)]
pub struct SimSettings {
    /// Simulated minutes added per step.
    pub time_step_minutes: i64,
    /// Steps a generator sits out after a generation attempt.
    pub generator_cooldown_steps: u32,
    /// Steps an analyzer sits out after processing a task.
    pub analyzer_cooldown_steps: u32,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            time_step_minutes: 60,
            generator_cooldown_steps: 3,
            analyzer_cooldown_steps: 2,
        }
    }
}

/// Owned simulation state: store handle, agent registry, status map, and
/// the simulated clock.
pub struct SimulationContext {
    store: Arc<dyn QueueStore>,
    agents: Vec<AgentRuntime>,
    statuses: HashMap<String, AgentStatus>,
    clock: DateTime<Utc>,
    settings: SimSettings,
}

impl SimulationContext {
    /// Build a context with every agent idle and the clock aligned to the
    /// top of the current hour.
    pub fn new(store: Arc<dyn QueueStore>, agents: Vec<AgentRuntime>, settings: SimSettings) -> Self {
        let statuses = agents
            .iter()
            .map(|agent| (agent.name().to_string(), AgentStatus::idle()))
            .collect();
        let clock = Utc::now()
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or_else(Utc::now);
        Self {
            store,
            agents,
            statuses,
            clock,
            settings,
        }
    }

    /// Current simulated time.
    pub fn clock(&self) -> DateTime<Utc> {
        self.clock
    }

    pub fn store(&self) -> &Arc<dyn QueueStore> {
        &self.store
    }

    pub fn settings(&self) -> &SimSettings {
        &self.settings
    }

    /// Scheduler status for one agent.
    pub fn status(&self, name: &str) -> Option<&AgentStatus> {
        self.statuses.get(name)
    }

    /// Agent views paired with their scheduler statuses, in registry order.
    pub fn agent_states(&self) -> Vec<(crate::agents::AgentView, AgentStatus)> {
        self.agents
            .iter()
            .map(|agent| {
                let status = self
                    .statuses
                    .get(agent.name())
                    .cloned()
                    .unwrap_or_else(AgentStatus::idle);
                (agent.view(), status)
            })
            .collect()
    }

    pub(crate) fn advance_clock(&mut self) {
        self.clock += Duration::minutes(self.settings.time_step_minutes);
    }
}
