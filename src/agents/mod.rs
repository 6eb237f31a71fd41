//! Agents module - the simulation's two agent roles.
//!
//! # Agent Types
//! - **GeneratorAgent**: produces new code snippets for the task queue
//! - **AnalyzerAgent**: consumes queued tasks and produces security analyses
//!
//! # Design Principles
//! - Closed variant type ([`AgentRuntime`]); the scheduler switches on the
//!   variant tag, no runtime type inspection
//! - Each agent exclusively owns its bounded memory log
//! - LLM failures never escape an agent; they degrade to a tagged outcome
//!   plus a memory entry

mod analyzer;
mod decode;
mod generator;

use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};

pub use analyzer::{AnalysisOutcome, AnalyzerAgent};
pub use decode::decode_snippet;
pub use generator::{GeneratedSnippet, GeneratorAgent};

/// Memory log capacity for analyzer agents.
pub const ANALYZER_MEMORY_CAP: usize = 50;
/// Memory log capacity for generator agents.
pub const GENERATOR_MEMORY_CAP: usize = 20;

/// The role of an agent, as exposed through the API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Generator,
    Analyzer,
}

/// Closed variant type over the two agent roles.
pub enum AgentRuntime {
    Generator(GeneratorAgent),
    Analyzer(AnalyzerAgent),
}

impl AgentRuntime {
    pub fn name(&self) -> &str {
        match self {
            Self::Generator(agent) => agent.name(),
            Self::Analyzer(agent) => agent.name(),
        }
    }

    pub fn kind(&self) -> AgentKind {
        match self {
            Self::Generator(_) => AgentKind::Generator,
            Self::Analyzer(_) => AgentKind::Analyzer,
        }
    }

    /// Serializable snapshot of the agent's own state (the scheduler adds
    /// phase and cooldown information on top).
    pub fn view(&self) -> AgentView {
        match self {
            Self::Generator(agent) => AgentView {
                name: agent.name().to_string(),
                kind: AgentKind::Generator,
                role_description: agent.task_description().to_string(),
                current_action: agent.current_action().to_string(),
                memories_count: agent.memory().len(),
                recent_memories: agent.memory().recent(3),
                findings_count: 0,
                recent_findings: Vec::new(),
            },
            Self::Analyzer(agent) => AgentView {
                name: agent.name().to_string(),
                kind: AgentKind::Analyzer,
                role_description: agent.role_description().to_string(),
                current_action: agent.current_action().to_string(),
                memories_count: agent.memory().len(),
                recent_memories: agent.memory().recent(3),
                findings_count: agent.findings().len(),
                recent_findings: agent
                    .findings()
                    .iter()
                    .rev()
                    .take(2)
                    .rev()
                    .cloned()
                    .collect(),
            },
        }
    }
}

/// Snapshot of one agent for the state query.
#[derive(Debug, Clone, Serialize)]
pub struct AgentView {
    pub name: String,
    pub kind: AgentKind,
    pub role_description: String,
    pub current_action: String,
    pub memories_count: usize,
    pub recent_memories: Vec<String>,
    pub findings_count: usize,
    pub recent_findings: Vec<String>,
}

/// Bounded, append-only memory log with FIFO eviction.
///
/// # Invariants
/// - `len() <= cap` at all times
/// - Insertion order equals chronological order; entries are never
///   reordered or deduplicated
#[derive(Debug, Clone)]
pub struct MemoryLog {
    entries: VecDeque<String>,
    cap: usize,
}

impl MemoryLog {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Append an entry, timestamped at append time; evicts the oldest
    /// entry when the log is at capacity.
    pub fn push(&mut self, entry: impl AsRef<str>) {
        let stamped = format!("[{}] {}", Utc::now().format("%H:%M:%S"), entry.as_ref());
        self.entries.push_back(stamped);
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
    }

    /// The last `k` entries, oldest of them first.
    pub fn recent(&self, k: usize) -> Vec<String> {
        let skip = self.entries.len().saturating_sub(k);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
