//! Request/response types for the control surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agents::AgentKind;
use crate::sim::AgentPhase;

/// Body for a manual task submission.
#[derive(Debug, Deserialize)]
pub struct SubmitTaskRequest {
    pub description: String,
    pub context: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitTaskResponse {
    pub message: String,
    pub task_id: String,
    pub queue_length: usize,
}

/// `?limit=` query for the listing endpoints.
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Full simulation state snapshot.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub current_simulation_time: DateTime<Utc>,
    pub queue_length: usize,
    pub results_count: usize,
    pub agents: Vec<AgentStateView>,
}

/// One agent's state: its own view plus the scheduler's status.
#[derive(Debug, Serialize)]
pub struct AgentStateView {
    pub name: String,
    pub kind: AgentKind,
    pub role_description: String,
    pub current_action: String,
    pub phase: AgentPhase,
    pub cooldown_steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_task_id: Option<String>,
    pub memories_count: usize,
    pub recent_memories: Vec<String>,
    pub findings_count: usize,
    pub recent_findings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub message: String,
    pub enqueued: usize,
    pub queue_length: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
