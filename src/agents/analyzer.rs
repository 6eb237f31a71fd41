//! Security analyzer agent - consumes tasks and produces analyses.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::llm::{ChatMessage, ChatOptions, LlmClient, LlmError};

use super::{MemoryLog, ANALYZER_MEMORY_CAP};

const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Fixed reason returned for a task with no context to analyze.
pub const EMPTY_CONTEXT_REASON: &str = "No target context provided for analysis.";

/// Outcome of one analysis attempt.
///
/// An explicit discriminant; callers never have to sniff the result text
/// for an error marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Completed { text: String },
    Failed { reason: String },
}

/// A cybersecurity analyst agent backed by the LLM collaborator.
pub struct AnalyzerAgent {
    name: String,
    role_description: String,
    model: String,
    temperature: f64,
    timeout: Duration,
    llm: Arc<dyn LlmClient>,
    memory: MemoryLog,
    current_action: String,
    findings: Vec<String>,
}

impl AnalyzerAgent {
    pub fn new(
        name: impl Into<String>,
        role_description: impl Into<String>,
        model: impl Into<String>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        Self {
            name: name.into(),
            role_description: role_description.into(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
            llm,
            memory: MemoryLog::new(ANALYZER_MEMORY_CAP),
            current_action: "Initialized".to_string(),
            findings: Vec::new(),
        }
    }

    /// Override the default sampling temperature and request timeout.
    pub fn with_request(mut self, temperature: f64, timeout: Duration) -> Self {
        self.temperature = temperature;
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role_description(&self) -> &str {
        &self.role_description
    }

    pub fn current_action(&self) -> &str {
        &self.current_action
    }

    pub fn memory(&self) -> &MemoryLog {
        &self.memory
    }

    pub fn findings(&self) -> &[String] {
        &self.findings
    }

    /// Analyze one task's context.
    ///
    /// Clears the findings list before starting. An empty `target_context`
    /// fails immediately without an LLM call; collaborator errors are
    /// converted to `Failed` outcomes plus a distinguishing memory entry.
    pub async fn analyze(
        &mut self,
        task_description: &str,
        target_context: &str,
        current_time: DateTime<Utc>,
    ) -> AnalysisOutcome {
        self.current_action = format!("Analyzing task: {}", task_description);
        self.findings.clear();

        if target_context.is_empty() {
            self.memory.push("Skipped task: No target context provided.");
            return AnalysisOutcome::Failed {
                reason: EMPTY_CONTEXT_REASON.to_string(),
            };
        }

        let recent = self.memory.recent(3);
        let memory_str = if recent.is_empty() {
            "None".to_string()
        } else {
            recent
                .iter()
                .map(|m| format!("- {}", m))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let messages = [
            ChatMessage::system(format!(
                "You are {}, a cybersecurity analyst AI. Your specific role is: {}. \
                 Analyze the provided context for security vulnerabilities according to \
                 best practices like the OWASP Top 10. Be specific and clear in your analysis.",
                self.name, self.role_description
            )),
            ChatMessage::user(format!(
                "Current time: {}.\n\
                 Your instructions for this specific task: {}\n\
                 Relevant recent memories/findings (if any):\n{}\n\n\
                 Context for analysis (e.g., code snippet):\n---\n{}\n---\n\n\
                 Based on your role and the specific task instructions, provide your \
                 analysis or next required action. If reporting vulnerabilities, describe \
                 the issue, potential impact, and suggest a mitigation. If the code looks \
                 secure for the given task, state that clearly. Respond concisely.",
                current_time.format("%Y-%m-%d %H:%M"),
                task_description,
                memory_str,
                target_context
            )),
        ];

        let options = ChatOptions {
            temperature: Some(self.temperature),
            timeout: Some(self.timeout),
        };

        match self.llm.chat_completion(&self.model, &messages, options).await {
            Ok(text) => {
                self.memory
                    .push(format!("Analysis complete. Result: {}", text));
                self.findings.push(text.clone());
                self.current_action =
                    format!("Completed analysis at {}", current_time.format("%H:%M"));
                AnalysisOutcome::Completed { text }
            }
            Err(err) => {
                tracing::error!(agent = %self.name, error = %err, "analysis request failed");
                let reason = match &err {
                    LlmError::Timeout => {
                        self.memory.push("Error: LLM request timed out.");
                        "LLM request timed out".to_string()
                    }
                    LlmError::Connection(detail) => {
                        self.memory
                            .push(format!("Error: LLM connection failed - {}", detail));
                        format!("failed to connect to LLM - {}", detail)
                    }
                    LlmError::Status(code) => {
                        self.memory
                            .push(format!("Error: LLM returned status {}", code));
                        format!("LLM returned status {}", code)
                    }
                    LlmError::MalformedResponse(_) => {
                        self.memory.push("Error: Unexpected response format from LLM.");
                        "could not parse LLM response".to_string()
                    }
                };
                self.current_action = "Analysis failed".to_string();
                AnalysisOutcome::Failed { reason }
            }
        }
    }
}
