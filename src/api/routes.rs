//! Router and request handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::queue::QueueStore;
use crate::samples;
use crate::sim::{SimulationContext, StepSummary};
use crate::task::{AnalysisRecord, Task};

use super::types::{
    AgentStateView, HealthResponse, LimitQuery, SeedResponse, StateResponse, SubmitTaskRequest,
    SubmitTaskResponse,
};

const DEFAULT_PEEK_LIMIT: usize = 5;
const DEFAULT_RESULTS_LIMIT: usize = 10;

/// Shared application state.
///
/// The write lock on `sim` serializes steps: one step runs to completion
/// before the next begins. The store handle is shared so submissions and
/// queries run concurrently with stepping; the store itself guarantees
/// dequeue atomicity.
pub struct AppState {
    pub sim: RwLock<SimulationContext>,
    pub store: Arc<dyn QueueStore>,
}

impl AppState {
    pub fn new(sim: SimulationContext) -> Self {
        let store = Arc::clone(sim.store());
        Self {
            sim: RwLock::new(sim),
            store,
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/step", post(run_step))
        .route("/api/state", get(get_state))
        .route("/api/tasks", post(submit_task).get(list_pending))
        .route("/api/results", get(list_results))
        .route("/api/results/:task_id", get(get_result))
        .route("/api/seed", post(seed_samples))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the listener fails.
pub async fn serve(state: Arc<AppState>, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "control surface listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn run_step(State(state): State<Arc<AppState>>) -> Json<StepSummary> {
    let mut sim = state.sim.write().await;
    Json(sim.run_step().await)
}

async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let sim = state.sim.read().await;
    let agents = sim
        .agent_states()
        .into_iter()
        .map(|(view, status)| AgentStateView {
            name: view.name,
            kind: view.kind,
            role_description: view.role_description,
            current_action: view.current_action,
            phase: status.phase,
            cooldown_steps: status.cooldown_steps,
            current_task_id: status.current_task_id,
            memories_count: view.memories_count,
            recent_memories: view.recent_memories,
            findings_count: view.findings_count,
            recent_findings: view.recent_findings,
        })
        .collect();

    Json(StateResponse {
        current_simulation_time: sim.clock(),
        queue_length: state.store.len().await,
        results_count: state.store.result_count().await,
        agents,
    })
}

async fn submit_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitTaskRequest>,
) -> Result<Json<SubmitTaskResponse>, (StatusCode, String)> {
    let task = Task::new(req.description, req.context, req.language, "User");
    let task_id = task.task_id.clone();

    if !state.store.enqueue(task).await {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to enqueue task".to_string(),
        ));
    }

    tracing::info!(%task_id, "manual task submitted");
    Ok(Json(SubmitTaskResponse {
        message: "Task submitted to queue.".to_string(),
        task_id,
        queue_length: state.store.len().await,
    }))
}

async fn list_pending(
    State(state): State<Arc<AppState>>,
    Query(q): Query<LimitQuery>,
) -> Json<Vec<Task>> {
    let limit = q.limit.unwrap_or(DEFAULT_PEEK_LIMIT);
    Json(state.store.peek(limit).await)
}

async fn list_results(
    State(state): State<Arc<AppState>>,
    Query(q): Query<LimitQuery>,
) -> Json<Vec<AnalysisRecord>> {
    let limit = q.limit.unwrap_or(DEFAULT_RESULTS_LIMIT);
    Json(state.store.recent_results(limit).await)
}

async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<AnalysisRecord>, (StatusCode, String)> {
    match state.store.get_result(&task_id).await {
        Some(record) => Ok(Json(record)),
        None => Err((
            StatusCode::NOT_FOUND,
            format!("no result for task '{}'", task_id),
        )),
    }
}

async fn seed_samples(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SeedResponse>, (StatusCode, String)> {
    let tasks = samples::sample_tasks();
    let total = tasks.len();
    let outcomes = futures::future::join_all(
        tasks
            .into_iter()
            .map(|task| state.store.enqueue(task)),
    )
    .await;
    let enqueued = outcomes.into_iter().filter(|ok| *ok).count();

    if enqueued == 0 {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to enqueue sample tasks".to_string(),
        ));
    }
    tracing::info!(enqueued, total, "sample tasks seeded");
    Ok(Json(SeedResponse {
        message: "Sample tasks enqueued.".to_string(),
        enqueued,
        queue_length: state.store.len().await,
    }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
