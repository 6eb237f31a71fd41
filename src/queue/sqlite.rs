//! Durable queue store backed by SQLite.
//!
//! Record bodies are stored as JSON documents; `task_id` is the join key.
//! Dequeue runs as a single transaction (select min seq, delete), so no
//! two callers can receive the same task even across processes sharing
//! the database file.

use std::path::Path;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use crate::task::{AnalysisRecord, Task};

use super::QueueStore;

/// SQLite-backed queue store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS task_queue (
                 seq     INTEGER PRIMARY KEY AUTOINCREMENT,
                 task_id TEXT NOT NULL,
                 body    TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS results_store (
                 task_id         TEXT PRIMARY KEY,
                 body            TEXT NOT NULL,
                 completion_time TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS failed_tasks (
                 seq  INTEGER PRIMARY KEY AUTOINCREMENT,
                 body TEXT NOT NULL
             );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn try_dequeue(conn: &mut Connection) -> rusqlite::Result<Option<String>> {
        let tx = conn.transaction()?;
        let head: Option<(i64, String)> = tx
            .query_row(
                "SELECT seq, body FROM task_queue ORDER BY seq LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let result = match head {
            Some((seq, body)) => {
                tx.execute("DELETE FROM task_queue WHERE seq = ?1", params![seq])?;
                Some(body)
            }
            None => None,
        };
        tx.commit()?;
        Ok(result)
    }
}

fn decode_task(body: &str) -> Option<Task> {
    match serde_json::from_str(body) {
        Ok(task) => Some(task),
        Err(e) => {
            tracing::warn!(error = %e, "could not decode task body from queue");
            None
        }
    }
}

fn decode_record(body: &str) -> Option<AnalysisRecord> {
    match serde_json::from_str(body) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(error = %e, "could not decode result body from store");
            None
        }
    }
}

#[async_trait]
impl QueueStore for SqliteStore {
    async fn enqueue(&self, task: Task) -> bool {
        let body = match serde_json::to_string(&task) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize task");
                return false;
            }
        };
        let conn = self.conn.lock().await;
        match conn.execute(
            "INSERT INTO task_queue (task_id, body) VALUES (?1, ?2)",
            params![task.task_id, body],
        ) {
            Ok(_) => {
                tracing::debug!(task_id = %task.task_id, "enqueued task");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to enqueue task");
                false
            }
        }
    }

    async fn dequeue(&self) -> Option<Task> {
        let mut conn = self.conn.lock().await;
        match Self::try_dequeue(&mut conn) {
            Ok(Some(body)) => decode_task(&body),
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, "failed to dequeue task");
                None
            }
        }
    }

    async fn len(&self) -> usize {
        let conn = self.conn.lock().await;
        match conn.query_row("SELECT COUNT(*) FROM task_queue", [], |row| {
            row.get::<_, i64>(0)
        }) {
            Ok(count) => count as usize,
            Err(e) => {
                tracing::error!(error = %e, "failed to read queue length");
                0
            }
        }
    }

    async fn peek(&self, limit: usize) -> Vec<Task> {
        let conn = self.conn.lock().await;
        let mut stmt = match conn.prepare("SELECT body FROM task_queue ORDER BY seq LIMIT ?1") {
            Ok(stmt) => stmt,
            Err(e) => {
                tracing::error!(error = %e, "failed to peek tasks");
                return Vec::new();
            }
        };
        let rows = stmt.query_map(params![limit as i64], |row| row.get::<_, String>(0));
        match rows {
            Ok(rows) => rows
                .filter_map(|body| body.ok())
                .filter_map(|body| decode_task(&body))
                .collect(),
            Err(e) => {
                tracing::error!(error = %e, "failed to peek tasks");
                Vec::new()
            }
        }
    }

    async fn store_result(&self, task_id: &str, record: AnalysisRecord) -> bool {
        let body = match serde_json::to_string(&record) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize analysis record");
                return false;
            }
        };
        let conn = self.conn.lock().await;
        match conn.execute(
            "INSERT INTO results_store (task_id, body, completion_time) VALUES (?1, ?2, ?3)
             ON CONFLICT(task_id) DO UPDATE SET
                 body = excluded.body,
                 completion_time = excluded.completion_time",
            params![task_id, body, record.completion_time.to_rfc3339()],
        ) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(error = %e, task_id, "failed to store result");
                false
            }
        }
    }

    async fn get_result(&self, task_id: &str) -> Option<AnalysisRecord> {
        let conn = self.conn.lock().await;
        let body: Option<String> = match conn
            .query_row(
                "SELECT body FROM results_store WHERE task_id = ?1",
                params![task_id],
                |row| row.get(0),
            )
            .optional()
        {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, task_id, "failed to read result");
                return None;
            }
        };
        body.and_then(|body| decode_record(&body))
    }

    async fn recent_results(&self, limit: usize) -> Vec<AnalysisRecord> {
        let conn = self.conn.lock().await;
        let mut stmt = match conn
            .prepare("SELECT body FROM results_store ORDER BY completion_time DESC LIMIT ?1")
        {
            Ok(stmt) => stmt,
            Err(e) => {
                tracing::error!(error = %e, "failed to read recent results");
                return Vec::new();
            }
        };
        let rows = stmt.query_map(params![limit as i64], |row| row.get::<_, String>(0));
        match rows {
            Ok(rows) => rows
                .filter_map(|body| body.ok())
                .filter_map(|body| decode_record(&body))
                .collect(),
            Err(e) => {
                tracing::error!(error = %e, "failed to read recent results");
                Vec::new()
            }
        }
    }

    async fn result_count(&self) -> usize {
        let conn = self.conn.lock().await;
        match conn.query_row("SELECT COUNT(*) FROM results_store", [], |row| {
            row.get::<_, i64>(0)
        }) {
            Ok(count) => count as usize,
            Err(e) => {
                tracing::error!(error = %e, "failed to read result count");
                0
            }
        }
    }

    async fn record_failure(&self, task: Task, error: &str) -> bool {
        let failed = crate::task::FailedTask::new(task, error);
        let body = match serde_json::to_string(&failed) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize failed task");
                return false;
            }
        };
        let conn = self.conn.lock().await;
        match conn.execute("INSERT INTO failed_tasks (body) VALUES (?1)", params![body]) {
            Ok(_) => {
                tracing::warn!(task_id = %failed.failed_task.task_id, error, "recorded failed task");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to record failed task");
                false
            }
        }
    }
}
