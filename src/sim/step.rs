//! The four-phase simulation step.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::agents::{AgentRuntime, AnalysisOutcome};
use crate::task::{AnalysisRecord, Task, TaskStatus};

use super::SimulationContext;

/// One event emitted during a step, serialized for the control surface.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StepEvent {
    CooldownExpired {
        agent: String,
    },
    TaskGenerated {
        agent: String,
        task_id: String,
        language: String,
    },
    GenerationFailed {
        agent: String,
    },
    EnqueueFailed {
        agent: String,
        task_id: String,
    },
    TaskAnalyzed {
        agent: String,
        task_id: String,
        status: TaskStatus,
    },
}

/// Summary of one executed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepSummary {
    pub step_time: DateTime<Utc>,
    pub next_time: DateTime<Utc>,
    pub events: Vec<StepEvent>,
}

impl SimulationContext {
    /// Execute exactly one simulation step.
    ///
    /// Fixed phase order: cooldown decay, generation, analysis, clock
    /// advance. Store refusals and collaborator failures are logged and
    /// never abort the step.
    pub async fn run_step(&mut self) -> StepSummary {
        let step_time = self.clock;
        let mut events = Vec::new();
        tracing::info!(step_time = %step_time.format("%Y-%m-%d %H:%M"), "running simulation step");

        self.decay_cooldowns(&mut events);
        self.generation_phase(&mut events).await;
        self.analysis_phase(&mut events).await;
        self.advance_clock();

        StepSummary {
            step_time,
            next_time: self.clock,
            events,
        }
    }

    fn decay_cooldowns(&mut self, events: &mut Vec<StepEvent>) {
        for (name, status) in self.statuses.iter_mut() {
            if status.tick_cooldown() {
                tracing::debug!(agent = %name, "cooldown expired");
                events.push(StepEvent::CooldownExpired {
                    agent: name.clone(),
                });
            }
        }
    }

    /// Invoke each idle generator once. The agent always ends the phase in
    /// cooldown, so a failing generator cannot be retried every step and
    /// flood the collaborator.
    async fn generation_phase(&mut self, events: &mut Vec<StepEvent>) {
        let clock = self.clock;
        for index in 0..self.agents.len() {
            let name = match &self.agents[index] {
                AgentRuntime::Generator(agent) => agent.name().to_string(),
                AgentRuntime::Analyzer(_) => continue,
            };
            let idle = self.statuses.get(&name).is_some_and(|s| s.is_idle());
            if !idle {
                continue;
            }

            if let Some(status) = self.statuses.get_mut(&name) {
                status.begin_generating();
            }

            let snippet = match &mut self.agents[index] {
                AgentRuntime::Generator(agent) => agent.generate(clock).await,
                AgentRuntime::Analyzer(_) => unreachable!("filtered above"),
            };

            match snippet {
                Some(snippet) => {
                    let task = Task::new(
                        snippet.description,
                        snippet.code,
                        Some(snippet.language.clone()),
                        name.clone(),
                    );
                    let task_id = task.task_id.clone();
                    if self.store.enqueue(task).await {
                        tracing::info!(agent = %name, task_id = %task_id, language = %snippet.language, "generated task enqueued");
                        events.push(StepEvent::TaskGenerated {
                            agent: name.clone(),
                            task_id,
                            language: snippet.language,
                        });
                    } else {
                        tracing::error!(agent = %name, task_id = %task_id, "store refused generated task");
                        events.push(StepEvent::EnqueueFailed {
                            agent: name.clone(),
                            task_id,
                        });
                    }
                }
                None => {
                    tracing::warn!(agent = %name, "generation produced no snippet");
                    events.push(StepEvent::GenerationFailed {
                        agent: name.clone(),
                    });
                }
            }

            if let Some(status) = self.statuses.get_mut(&name) {
                status.begin_cooldown(self.settings.generator_cooldown_steps);
            }
        }
    }

    /// Give each idle analyzer at most one task. Stops without spinning as
    /// soon as the queue reports empty or a dequeue comes back empty (a
    /// racing consumer or a stale length estimate).
    async fn analysis_phase(&mut self, events: &mut Vec<StepEvent>) {
        let clock = self.clock;
        for index in 0..self.agents.len() {
            let name = match &self.agents[index] {
                AgentRuntime::Analyzer(agent) => agent.name().to_string(),
                AgentRuntime::Generator(_) => continue,
            };
            let idle = self.statuses.get(&name).is_some_and(|s| s.is_idle());
            if !idle {
                continue;
            }

            if self.store.len().await == 0 {
                break;
            }
            let Some(task) = self.store.dequeue().await else {
                break;
            };

            if let Some(status) = self.statuses.get_mut(&name) {
                status.begin_analyzing(task.task_id.clone());
            }

            let outcome = match &mut self.agents[index] {
                AgentRuntime::Analyzer(agent) => {
                    agent.analyze(&task.description, &task.context, clock).await
                }
                AgentRuntime::Generator(_) => unreachable!("filtered above"),
            };

            let (analysis_result, status, failure) = match outcome {
                AnalysisOutcome::Completed { text } => (text, TaskStatus::Completed, None),
                AnalysisOutcome::Failed { reason } => {
                    (reason.clone(), TaskStatus::AnalysisFailed, Some(reason))
                }
            };

            let mut completed_task = task.clone();
            completed_task.status = status;
            let record = AnalysisRecord {
                task_id: task.task_id.clone(),
                original_task: completed_task,
                analysis_result,
                analyzed_by: name.clone(),
                status,
                completion_time: Utc::now(),
            };

            if !self.store.store_result(&task.task_id, record).await {
                tracing::error!(task_id = %task.task_id, "store refused analysis record");
            }
            if let Some(reason) = failure {
                self.store.record_failure(task.clone(), &reason).await;
            }

            if let Some(agent_status) = self.statuses.get_mut(&name) {
                agent_status.begin_cooldown(self.settings.analyzer_cooldown_steps);
            }
            tracing::info!(agent = %name, task_id = %task.task_id, ?status, "task analyzed");
            events.push(StepEvent::TaskAnalyzed {
                agent: name,
                task_id: task.task_id,
                status,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::agents::{AnalyzerAgent, GeneratorAgent};
    use crate::llm::{ChatMessage, ChatOptions, LlmClient, LlmError};
    use crate::queue::{InMemoryStore, QueueStore};
    use crate::sim::{AgentPhase, SimSettings, SimulationContext};

    /// Replays a fixed list of completions, then errors.
    struct ScriptedClient {
        responses: Mutex<Vec<Result<String, LlmError>>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
            })
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn chat_completion(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _options: ChatOptions,
        ) -> Result<String, LlmError> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(LlmError::Connection("script exhausted".to_string()));
            }
            responses.remove(0)
        }
    }

    /// Wraps the in-memory store to count dequeue attempts.
    struct CountingStore {
        inner: InMemoryStore,
        dequeues: AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: InMemoryStore::new(),
                dequeues: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl QueueStore for CountingStore {
        async fn enqueue(&self, task: Task) -> bool {
            self.inner.enqueue(task).await
        }
        async fn dequeue(&self) -> Option<Task> {
            self.dequeues.fetch_add(1, Ordering::SeqCst);
            self.inner.dequeue().await
        }
        async fn len(&self) -> usize {
            self.inner.len().await
        }
        async fn peek(&self, limit: usize) -> Vec<Task> {
            self.inner.peek(limit).await
        }
        async fn store_result(&self, task_id: &str, record: AnalysisRecord) -> bool {
            self.inner.store_result(task_id, record).await
        }
        async fn get_result(&self, task_id: &str) -> Option<AnalysisRecord> {
            self.inner.get_result(task_id).await
        }
        async fn recent_results(&self, limit: usize) -> Vec<AnalysisRecord> {
            self.inner.recent_results(limit).await
        }
        async fn result_count(&self) -> usize {
            self.inner.result_count().await
        }
        async fn record_failure(&self, task: Task, error: &str) -> bool {
            self.inner.record_failure(task, error).await
        }
    }

    fn analyzer(name: &str, llm: Arc<dyn LlmClient>) -> AgentRuntime {
        AgentRuntime::Analyzer(AnalyzerAgent::new(name, "Analyze code.", "test-model", llm))
    }

    fn generator(name: &str, llm: Arc<dyn LlmClient>) -> AgentRuntime {
        AgentRuntime::Generator(GeneratorAgent::new(name, "test-model", llm))
    }

    fn settings() -> SimSettings {
        SimSettings {
            time_step_minutes: 60,
            generator_cooldown_steps: 3,
            analyzer_cooldown_steps: 2,
        }
    }

    #[tokio::test]
    async fn test_empty_queue_idle_analyzer_no_dequeue_attempts() {
        let store = Arc::new(CountingStore::new());
        let llm = ScriptedClient::new(vec![]);
        let mut sim = SimulationContext::new(
            Arc::clone(&store) as Arc<dyn QueueStore>,
            vec![analyzer("Scanner", llm)],
            settings(),
        );

        let summary = sim.run_step().await;

        assert!(summary.events.is_empty());
        assert_eq!(store.dequeues.load(Ordering::SeqCst), 0);
        assert_eq!(store.len().await, 0);
        assert!(sim.status("Scanner").unwrap().is_idle());
    }

    #[tokio::test]
    async fn test_generator_success_enqueues_one_pending_task() {
        let store: Arc<dyn QueueStore> = Arc::new(InMemoryStore::new());
        let raw = r#"{"language": "python", "description": "d", "code": "c"}"#;
        let llm = ScriptedClient::new(vec![Ok(raw.to_string())]);
        let mut sim = SimulationContext::new(
            Arc::clone(&store),
            vec![generator("CodeGenAgent", llm)],
            settings(),
        );

        let summary = sim.run_step().await;

        assert_eq!(store.len().await, 1);
        let pending = store.peek(5).await;
        assert_eq!(pending[0].context, "c");
        assert_eq!(pending[0].description, "d");
        assert_eq!(pending[0].submitted_by, "CodeGenAgent");
        assert_eq!(pending[0].status, TaskStatus::Pending);

        let status = sim.status("CodeGenAgent").unwrap();
        assert_eq!(status.phase, AgentPhase::Cooldown);
        assert_eq!(status.cooldown_steps, 3);
        assert!(matches!(
            summary.events[0],
            StepEvent::TaskGenerated { ref language, .. } if language == "python"
        ));
    }

    #[tokio::test]
    async fn test_failed_generator_still_enters_cooldown() {
        let store: Arc<dyn QueueStore> = Arc::new(InMemoryStore::new());
        let llm = ScriptedClient::new(vec![Err(LlmError::Timeout)]);
        let mut sim = SimulationContext::new(
            Arc::clone(&store),
            vec![generator("CodeGenAgent", llm)],
            settings(),
        );

        let summary = sim.run_step().await;

        assert_eq!(store.len().await, 0);
        assert_eq!(
            summary.events,
            vec![StepEvent::GenerationFailed {
                agent: "CodeGenAgent".to_string()
            }]
        );
        let status = sim.status("CodeGenAgent").unwrap();
        assert_eq!(status.phase, AgentPhase::Cooldown);
        assert_eq!(status.cooldown_steps, 3);
    }

    #[tokio::test]
    async fn test_empty_context_task_records_failure() {
        let store = Arc::new(InMemoryStore::new());
        let llm = ScriptedClient::new(vec![]);
        let mut sim = SimulationContext::new(
            Arc::clone(&store) as Arc<dyn QueueStore>,
            vec![analyzer("Scanner", llm)],
            settings(),
        );

        let task = Task::new("analyze", "", None, "User");
        let task_id = task.task_id.clone();
        store.enqueue(task).await;

        let summary = sim.run_step().await;

        let record = store.get_result(&task_id).await.unwrap();
        assert_eq!(record.status, TaskStatus::AnalysisFailed);
        assert_eq!(
            record.analysis_result,
            "No target context provided for analysis."
        );
        assert_eq!(record.original_task.status, TaskStatus::AnalysisFailed);

        let failures = store.failures().await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].failed_task.task_id, task_id);

        let status = sim.status("Scanner").unwrap();
        assert_eq!(status.phase, AgentPhase::Cooldown);
        assert_eq!(status.cooldown_steps, 2);
        assert!(status.current_task_id.is_none());
        assert!(matches!(
            summary.events[0],
            StepEvent::TaskAnalyzed {
                status: TaskStatus::AnalysisFailed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_successful_analysis_stores_completed_record() {
        let store = Arc::new(InMemoryStore::new());
        let llm = ScriptedClient::new(vec![Ok("Looks vulnerable to SQLi.".to_string())]);
        let mut sim = SimulationContext::new(
            Arc::clone(&store) as Arc<dyn QueueStore>,
            vec![analyzer("Scanner", llm)],
            settings(),
        );

        let task = Task::new("analyze", "SELECT * FROM users", None, "User");
        let task_id = task.task_id.clone();
        store.enqueue(task).await;

        sim.run_step().await;

        let record = store.get_result(&task_id).await.unwrap();
        assert_eq!(record.status, TaskStatus::Completed);
        assert_eq!(record.analysis_result, "Looks vulnerable to SQLi.");
        assert_eq!(record.analyzed_by, "Scanner");
        assert!(store.failures().await.is_empty());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_cooldown_blocks_work_until_expiry() {
        let store = Arc::new(InMemoryStore::new());
        let llm = ScriptedClient::new(vec![
            Ok("first analysis".to_string()),
            Ok("second analysis".to_string()),
        ]);
        let mut sim = SimulationContext::new(
            Arc::clone(&store) as Arc<dyn QueueStore>,
            vec![analyzer("Scanner", llm)],
            settings(),
        );

        store.enqueue(Task::new("a", "code a", None, "User")).await;
        store.enqueue(Task::new("b", "code b", None, "User")).await;

        // Step 1: first task processed, analyzer demoted (cooldown 2).
        sim.run_step().await;
        assert_eq!(store.len().await, 1);
        assert_eq!(sim.status("Scanner").unwrap().cooldown_steps, 2);

        // Step 2: cooldown decays to 1; second task stays queued.
        sim.run_step().await;
        assert_eq!(store.len().await, 1);
        assert_eq!(sim.status("Scanner").unwrap().phase, AgentPhase::Cooldown);

        // Step 3: cooldown expires, analyzer picks up the second task.
        let summary = sim.run_step().await;
        assert_eq!(store.len().await, 0);
        assert!(summary
            .events
            .iter()
            .any(|e| matches!(e, StepEvent::CooldownExpired { .. })));
        assert!(summary
            .events
            .iter()
            .any(|e| matches!(e, StepEvent::TaskAnalyzed { .. })));
    }

    #[tokio::test]
    async fn test_one_task_assigned_per_analyzer_per_step() {
        let store = Arc::new(InMemoryStore::new());
        let llm = ScriptedClient::new(vec![Ok("one".to_string()), Ok("two".to_string())]);
        let mut sim = SimulationContext::new(
            Arc::clone(&store) as Arc<dyn QueueStore>,
            vec![
                analyzer("ScannerA", Arc::clone(&llm) as Arc<dyn LlmClient>),
                analyzer("ScannerB", llm),
            ],
            settings(),
        );

        for n in 0..3 {
            store
                .enqueue(Task::new(format!("t{}", n), "code", None, "User"))
                .await;
        }

        let summary = sim.run_step().await;

        // Two analyzers, two tasks consumed; the third waits for the next idle analyzer.
        assert_eq!(store.len().await, 1);
        let analyzed = summary
            .events
            .iter()
            .filter(|e| matches!(e, StepEvent::TaskAnalyzed { .. }))
            .count();
        assert_eq!(analyzed, 2);
    }

    #[tokio::test]
    async fn test_clock_advances_by_step_size() {
        let store: Arc<dyn QueueStore> = Arc::new(InMemoryStore::new());
        let llm = ScriptedClient::new(vec![]);
        let mut sim = SimulationContext::new(store, vec![analyzer("Scanner", llm)], settings());

        let before = sim.clock();
        let summary = sim.run_step().await;
        assert_eq!(summary.step_time, before);
        assert_eq!(summary.next_time, before + chrono::Duration::minutes(60));
        assert_eq!(sim.clock(), summary.next_time);
    }
}
