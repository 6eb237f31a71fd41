//! Process-local queue store (the default backend).

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::task::{AnalysisRecord, FailedTask, Task};

use super::QueueStore;

#[derive(Default)]
struct Inner {
    queue: VecDeque<Task>,
    results: HashMap<String, AnalysisRecord>,
    failures: Vec<FailedTask>,
}

/// In-memory queue store. One mutex guards all three collections, so
/// dequeue atomicity holds across concurrent callers.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the failed-task audit log, oldest first.
    pub async fn failures(&self) -> Vec<FailedTask> {
        self.inner.lock().await.failures.clone()
    }
}

#[async_trait]
impl QueueStore for InMemoryStore {
    async fn enqueue(&self, task: Task) -> bool {
        let mut inner = self.inner.lock().await;
        tracing::debug!(task_id = %task.task_id, "enqueued task");
        inner.queue.push_back(task);
        true
    }

    async fn dequeue(&self) -> Option<Task> {
        let mut inner = self.inner.lock().await;
        let task = inner.queue.pop_front();
        if let Some(task) = &task {
            tracing::debug!(task_id = %task.task_id, "dequeued task");
        }
        task
    }

    async fn len(&self) -> usize {
        self.inner.lock().await.queue.len()
    }

    async fn peek(&self, limit: usize) -> Vec<Task> {
        let inner = self.inner.lock().await;
        inner.queue.iter().take(limit).cloned().collect()
    }

    async fn store_result(&self, task_id: &str, record: AnalysisRecord) -> bool {
        let mut inner = self.inner.lock().await;
        inner.results.insert(task_id.to_string(), record);
        true
    }

    async fn get_result(&self, task_id: &str) -> Option<AnalysisRecord> {
        self.inner.lock().await.results.get(task_id).cloned()
    }

    async fn recent_results(&self, limit: usize) -> Vec<AnalysisRecord> {
        let inner = self.inner.lock().await;
        // No ordering index; full scan-and-sort on completion time.
        let mut records: Vec<AnalysisRecord> = inner.results.values().cloned().collect();
        records.sort_by(|a, b| b.completion_time.cmp(&a.completion_time));
        records.truncate(limit);
        records
    }

    async fn result_count(&self) -> usize {
        self.inner.lock().await.results.len()
    }

    async fn record_failure(&self, task: Task, error: &str) -> bool {
        let mut inner = self.inner.lock().await;
        tracing::warn!(task_id = %task.task_id, error, "recording failed task");
        inner.failures.push(FailedTask::new(task, error));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;

    use crate::task::TaskStatus;

    fn task(n: usize) -> Task {
        Task::new(format!("task {}", n), format!("code {}", n), None, "User")
    }

    fn record(task: Task, text: &str) -> AnalysisRecord {
        AnalysisRecord {
            task_id: task.task_id.clone(),
            analyzed_by: "TestAnalyzer".to_string(),
            analysis_result: text.to_string(),
            status: TaskStatus::Completed,
            completion_time: Utc::now(),
            original_task: task,
        }
    }

    #[tokio::test]
    async fn test_fifo_order_preserved() {
        let store = InMemoryStore::new();
        let tasks: Vec<Task> = (0..5).map(task).collect();
        for t in &tasks {
            assert!(store.enqueue(t.clone()).await);
        }
        for expected in &tasks {
            let got = store.dequeue().await.unwrap();
            assert_eq!(got.task_id, expected.task_id);
        }
        assert!(store.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_dequeue_returns_each_task_once() {
        let store = Arc::new(InMemoryStore::new());
        for n in 0..20 {
            store.enqueue(task(n)).await;
        }

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(t) = store.dequeue().await {
                    seen.push(t.task_id);
                }
                seen
            }));
        }

        let mut all: Vec<String> = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        assert_eq!(all.len(), 20);
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 20, "a task was dequeued twice");
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_peek_is_non_destructive_and_oldest_first() {
        let store = InMemoryStore::new();
        let tasks: Vec<Task> = (0..4).map(task).collect();
        for t in &tasks {
            store.enqueue(t.clone()).await;
        }
        let peeked = store.peek(2).await;
        assert_eq!(peeked.len(), 2);
        assert_eq!(peeked[0].task_id, tasks[0].task_id);
        assert_eq!(peeked[1].task_id, tasks[1].task_id);
        assert_eq!(store.len().await, 4);
    }

    #[tokio::test]
    async fn test_result_overwrite_is_last_writer_wins() {
        let store = InMemoryStore::new();
        let t = task(0);
        let id = t.task_id.clone();
        assert!(store.store_result(&id, record(t.clone(), "first")).await);
        assert!(store.store_result(&id, record(t, "second")).await);
        assert_eq!(store.result_count().await, 1);
        let got = store.get_result(&id).await.unwrap();
        assert_eq!(got.analysis_result, "second");
    }

    #[tokio::test]
    async fn test_recent_results_newest_first() {
        let store = InMemoryStore::new();
        for n in 0..3 {
            let t = task(n);
            let mut r = record(t.clone(), &format!("analysis {}", n));
            r.completion_time = Utc::now() + chrono::Duration::seconds(n as i64);
            store.store_result(&t.task_id, r).await;
        }
        let recent = store.recent_results(2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].analysis_result, "analysis 2");
        assert_eq!(recent[1].analysis_result, "analysis 1");
    }

    #[tokio::test]
    async fn test_failures_are_append_only() {
        let store = InMemoryStore::new();
        let t = task(0);
        assert!(store.record_failure(t.clone(), "boom").await);
        assert!(store.record_failure(t.clone(), "boom again").await);
        let failures = store.failures().await;
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].error, "boom");
        assert_eq!(failures[1].failed_task.task_id, t.task_id);
    }

    #[tokio::test]
    async fn test_get_result_missing_is_none() {
        let store = InMemoryStore::new();
        assert!(store.get_result("no-such-id").await.is_none());
        assert_eq!(store.result_count().await, 0);
    }
}
