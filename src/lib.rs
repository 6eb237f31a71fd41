//! Queue-mediated multi-agent security analysis simulation.
//!
//! Producer agents generate code snippets for analysis; consumer agents
//! pull them from a shared FIFO queue and ask an LLM collaborator for a
//! security review. Cooldown-based scheduling bounds collaborator call
//! volume: each simulation step gives every idle agent at most one unit
//! of work, then demotes it into cooldown.
//!
//! # Modules
//! - [`task`]: Task / AnalysisRecord / FailedTask data model
//! - [`queue`]: FIFO queue + result store (in-memory and SQLite backends)
//! - [`agents`]: generator and analyzer agents with bounded memory logs
//! - [`llm`]: the LLM collaborator client
//! - [`sim`]: the scheduler and its four-phase step
//! - [`api`]: the HTTP control surface

pub mod agents;
pub mod api;
pub mod config;
pub mod llm;
pub mod queue;
pub mod samples;
pub mod sim;
pub mod task;
