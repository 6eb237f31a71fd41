//! Per-agent scheduling status, owned by the scheduler.
//!
//! State machine: `idle -> {generating | analyzing} -> cooldown -> idle`.
//! The active phases never survive a step boundary; each unit of work
//! runs to completion before the status changes again.

use serde::Serialize;

/// Scheduling phase of one agent.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentPhase {
    Idle,
    Generating,
    Analyzing,
    Cooldown,
}

/// Scheduler-owned status for one agent, decoupled from the agent's own
/// state.
///
/// # Invariants
/// - `current_task_id` is set only while `phase == Analyzing`; cleared on
///   the transition to cooldown
/// - `cooldown_steps > 0` only while `phase == Cooldown`
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    pub phase: AgentPhase,
    pub current_task_id: Option<String>,
    pub cooldown_steps: u32,
}

impl AgentStatus {
    pub fn idle() -> Self {
        Self {
            phase: AgentPhase::Idle,
            current_task_id: None,
            cooldown_steps: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.phase == AgentPhase::Idle
    }

    pub fn begin_generating(&mut self) {
        self.phase = AgentPhase::Generating;
    }

    pub fn begin_analyzing(&mut self, task_id: String) {
        self.phase = AgentPhase::Analyzing;
        self.current_task_id = Some(task_id);
    }

    /// Demote the agent into cooldown, clearing any active task.
    ///
    /// A duration of zero is valid but aggressive; the agent re-enters
    /// idle on the next step's decay.
    pub fn begin_cooldown(&mut self, steps: u32) {
        self.phase = AgentPhase::Cooldown;
        self.current_task_id = None;
        self.cooldown_steps = steps;
    }

    /// One step of cooldown decay. Returns true when the cooldown expired
    /// on this tick (the agent just became idle).
    pub fn tick_cooldown(&mut self) -> bool {
        if self.phase != AgentPhase::Cooldown {
            return false;
        }
        self.cooldown_steps = self.cooldown_steps.saturating_sub(1);
        if self.cooldown_steps == 0 {
            self.phase = AgentPhase::Idle;
            return true;
        }
        false
    }
}
