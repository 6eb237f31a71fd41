//! Binary entrypoint: config, store selection, agent registry, serve.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use cybersim::agents::{AgentRuntime, AnalyzerAgent, GeneratorAgent};
use cybersim::api::AppState;
use cybersim::config::Config;
use cybersim::llm::{LlmClient, LmStudioClient};
use cybersim::queue::{InMemoryStore, QueueStore, SqliteStore};
use cybersim::sim::SimulationContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cybersim=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!(
        model = %config.llm_model,
        llm_url = %config.lm_studio_url,
        "starting cybersecurity agent simulation backend"
    );

    let store: Arc<dyn QueueStore> = match &config.db_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "using SQLite queue store");
            Arc::new(SqliteStore::open(path)?)
        }
        None => {
            tracing::info!("using in-memory queue store");
            Arc::new(InMemoryStore::new())
        }
    };

    let llm: Arc<dyn LlmClient> = Arc::new(LmStudioClient::new(&config.lm_studio_url));

    let agents = vec![
        AgentRuntime::Generator(GeneratorAgent::new(
            "CodeGenAgent",
            &config.llm_model,
            Arc::clone(&llm),
        )),
        AgentRuntime::Analyzer(AnalyzerAgent::new(
            "CodeScannerAgent",
            "Analyze Python code snippets for common vulnerabilities like SQL injection, \
             path traversal, and insecure deserialization.",
            &config.llm_model,
            Arc::clone(&llm),
        )),
        AgentRuntime::Analyzer(AnalyzerAgent::new(
            "JavaRefactorAgent",
            "Analyze Java code for SQL injection vulnerabilities and suggest refactored \
             code to mitigate them using PreparedStatement.",
            &config.llm_model,
            Arc::clone(&llm),
        )),
    ];

    let sim = SimulationContext::new(store, agents, config.sim_settings());
    let state = Arc::new(AppState::new(sim));

    cybersim::api::serve(state, &config.bind_addr).await
}
