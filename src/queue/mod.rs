//! Queue store - durable FIFO task queue plus keyed result storage.
//!
//! # Backends
//! - **InMemoryStore**: process-local, the default
//! - **SqliteStore**: durable, file-backed
//!
//! # Contract
//! Every operation signals failure in its return value (`bool` / `Option` /
//! empty `Vec`) rather than returning an error; backend failures are logged
//! at the store boundary. The scheduler treats a failed write as a logged,
//! non-fatal event and continues its step.

mod memory;
mod sqlite;

use async_trait::async_trait;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use crate::task::{AnalysisRecord, Task};

/// FIFO task queue plus keyed result store.
///
/// # Invariants
/// - `dequeue()` never returns the same task twice, even under
///   concurrent callers
/// - `len()` is best-effort; a nonzero length means "try to dequeue",
///   never a reservation
/// - `store_result()` is a last-writer-wins upsert keyed by task id
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Append a task to the tail of the queue. A failed append must not
    /// corrupt existing queue state.
    async fn enqueue(&self, task: Task) -> bool;

    /// Atomically remove and return the head task; `None` when empty.
    async fn dequeue(&self) -> Option<Task>;

    /// Current pending count; may be stale by the time the caller acts.
    async fn len(&self) -> usize;

    /// Up to `limit` pending tasks, oldest first, without removal.
    async fn peek(&self, limit: usize) -> Vec<Task>;

    /// Upsert the analysis record for a task id.
    async fn store_result(&self, task_id: &str, record: AnalysisRecord) -> bool;

    /// Look up one analysis record.
    async fn get_result(&self, task_id: &str) -> Option<AnalysisRecord>;

    /// Up to `limit` records, most recently completed first. Backends may
    /// scan-and-sort; callers must not assume O(limit) cost.
    async fn recent_results(&self, limit: usize) -> Vec<AnalysisRecord>;

    /// Total number of stored analysis records.
    async fn result_count(&self) -> usize;

    /// Append a failed-task audit record, best-effort; a refusal here
    /// never rolls back the result write that preceded it.
    async fn record_failure(&self, task: Task, error: &str) -> bool;
}
