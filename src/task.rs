//! Core task and result records exchanged through the queue.
//!
//! All records are flat JSON documents with `task_id` as the join key.
//! Fields are additive; there is no schema migration concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a task (and of the stored analysis record).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
    AnalysisFailed,
}

/// A unit of analysis work awaiting an analyzer agent.
///
/// # Invariants
/// - Immutable once enqueued, except for the status transition applied
///   by the consuming analyzer.
/// - Removed from the pending queue exactly once, atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub description: String,
    /// Content to analyze (e.g. a code snippet).
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Agent name, or "User" for manual submissions.
    pub submitted_by: String,
    pub status: TaskStatus,
    pub submitted_time: DateTime<Utc>,
}

impl Task {
    /// Create a fresh pending task with a new unique id.
    pub fn new(
        description: impl Into<String>,
        context: impl Into<String>,
        language: Option<String>,
        submitted_by: impl Into<String>,
    ) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            description: description.into(),
            context: context.into(),
            language,
            submitted_by: submitted_by.into(),
            status: TaskStatus::Pending,
            submitted_time: Utc::now(),
        }
    }
}

/// The stored outcome of processing one task, keyed by `task_id`.
///
/// Later writes for the same id overwrite earlier ones (last-writer-wins).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub task_id: String,
    /// Snapshot of the originating task, carrying its terminal status.
    pub original_task: Task,
    pub analysis_result: String,
    pub analyzed_by: String,
    pub status: TaskStatus,
    pub completion_time: DateTime<Utc>,
}

/// Append-only audit record for a task whose analysis failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedTask {
    pub failed_task: Task,
    pub error: String,
    pub failed_time: DateTime<Utc>,
}

impl FailedTask {
    pub fn new(failed_task: Task, error: impl Into<String>) -> Self {
        Self {
            failed_task,
            error: error.into(),
            failed_time: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_is_pending_with_unique_id() {
        let a = Task::new("analyze", "code", Some("python".to_string()), "User");
        let b = Task::new("analyze", "code", None, "User");
        assert_eq!(a.status, TaskStatus::Pending);
        assert_ne!(a.task_id, b.task_id);
        assert_eq!(a.submitted_by, "User");
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&TaskStatus::AnalysisFailed).unwrap();
        assert_eq!(json, "\"analysis_failed\"");
        let back: TaskStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(back, TaskStatus::Pending);
    }

    #[test]
    fn test_task_roundtrips_through_json() {
        let task = Task::new("d", "c", Some("java".to_string()), "CodeGenAgent");
        let json = serde_json::to_string(&task).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back.task_id, task.task_id);
        assert_eq!(back.language.as_deref(), Some("java"));
    }
}
