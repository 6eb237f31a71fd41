//! HTTP control surface for the simulation.
//!
//! ## Endpoints
//!
//! - `POST /api/step` - Execute exactly one scheduler step
//! - `GET /api/state` - Simulated time, queue length, agent statuses
//! - `POST /api/tasks` - Submit a task manually (`submitted_by = "User"`)
//! - `GET /api/tasks` - Peek at pending tasks (non-destructive)
//! - `GET /api/results` - Recent analysis records, newest first
//! - `GET /api/results/{task_id}` - Single analysis record
//! - `POST /api/seed` - Enqueue the bundled sample snippets
//! - `GET /api/health` - Health check

mod routes;
pub mod types;

pub use routes::{router, serve, AppState};
pub use types::*;
