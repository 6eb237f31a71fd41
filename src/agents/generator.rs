//! Code generator agent - produces snippets for the task queue.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::{ChatMessage, ChatOptions, LlmClient, LlmError};

use super::{decode, MemoryLog, GENERATOR_MEMORY_CAP};

const DEFAULT_TEMPERATURE: f64 = 0.5;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

/// A generated code snippet, decoded from the model's JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedSnippet {
    pub language: String,
    pub description: String,
    pub code: String,
}

/// An agent that asks the LLM collaborator for new code snippets.
///
/// Every parse or network failure degrades to `None` plus a memory
/// entry; nothing escapes this boundary.
pub struct GeneratorAgent {
    name: String,
    task_description: String,
    model: String,
    temperature: f64,
    timeout: Duration,
    llm: Arc<dyn LlmClient>,
    memory: MemoryLog,
    current_action: String,
}

impl GeneratorAgent {
    pub fn new(name: impl Into<String>, model: impl Into<String>, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            name: name.into(),
            task_description: "Generate code snippets for security analysis.".to_string(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
            llm,
            memory: MemoryLog::new(GENERATOR_MEMORY_CAP),
            current_action: "Initialized".to_string(),
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

    pub fn task_description(&self) -> &str {
        &self.task_description
    }

    pub fn current_action(&self) -> &str {
        &self.current_action
    }

    pub fn memory(&self) -> &MemoryLog {
        &self.memory
    }

    /// Request one new snippet from the collaborator.
    pub async fn generate(&mut self, _current_time: DateTime<Utc>) -> Option<GeneratedSnippet> {
        self.current_action = "Generating new code snippet...".to_string();
        tracing::debug!(agent = %self.name, "starting code generation");

        let messages = [
            ChatMessage::system(format!(
                "You are {}, an AI assistant that generates simple code snippets \
                 (Python, Java, Javascript) for cybersecurity training purposes. The code \
                 should ideally contain a potential, common security flaw or represent a \
                 pattern worth analyzing (e.g., related to input handling, database \
                 interaction, file access).",
                self.name
            )),
            ChatMessage::user(
                "Generate a new code snippet (around 10-30 lines) and a brief description \
                 of its intended function and the language used. Format the output ONLY as \
                 a JSON object with keys 'language', 'description', 'code'. Example language \
                 values: 'python', 'java', 'javascript'. Example description: 'Simple Python \
                 function to fetch user data, potentially vulnerable to SQLi'.\n\
                 Do not include any other text before or after the JSON object.",
            ),
        ];

        let options = ChatOptions {
            temperature: Some(self.temperature),
            timeout: Some(self.timeout),
        };

        let raw = match self.llm.chat_completion(&self.model, &messages, options).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::error!(agent = %self.name, error = %err, "generation request failed");
                match &err {
                    LlmError::Timeout => self.memory.push("Error: LLM request timed out."),
                    LlmError::Connection(detail) => self
                        .memory
                        .push(format!("Error: LLM connection failed - {}", detail)),
                    LlmError::Status(code) => self
                        .memory
                        .push(format!("Error: LLM returned status {}", code)),
                    LlmError::MalformedResponse(_) => self
                        .memory
                        .push("Error: Unexpected response format from LLM."),
                }
                self.current_action = "Code generation failed".to_string();
                return None;
            }
        };

        match decode::decode_snippet(&raw) {
            Some(snippet) => {
                self.memory.push(format!(
                    "Generated {} code:\nDescription: {}\nCode:\n{}",
                    snippet.language, snippet.description, snippet.code
                ));
                self.current_action = "Code generation successful".to_string();
                tracing::debug!(agent = %self.name, language = %snippet.language, "generated snippet");
                Some(snippet)
            }
            None => {
                tracing::error!(agent = %self.name, "failed to extract valid JSON from generated output");
                self.memory
                    .push("Error: Failed to extract valid JSON from generated output.");
                self.current_action = "Code generation failed".to_string();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedClient(Result<String, fn() -> LlmError>);

    #[async_trait]
    impl LlmClient for FixedClient {
        async fn chat_completion(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _options: ChatOptions,
        ) -> Result<String, LlmError> {
            self.0.clone().map_err(|make| make())
        }
    }

    fn generator(llm: Arc<dyn LlmClient>) -> GeneratorAgent {
        GeneratorAgent::new("TestGen", "test-model", llm)
    }

    #[tokio::test]
    async fn test_valid_response_yields_snippet() {
        let raw = r#"{"language": "python", "description": "d", "code": "x = input()"}"#;
        let mut agent = generator(Arc::new(FixedClient(Ok(raw.to_string()))));
        let snippet = agent.generate(Utc::now()).await.unwrap();
        assert_eq!(snippet.language, "python");
        assert_eq!(agent.current_action(), "Code generation successful");
        assert!(agent.memory().recent(1)[0].contains("Generated python code"));
    }

    #[tokio::test]
    async fn test_unparseable_response_yields_none() {
        let mut agent = generator(Arc::new(FixedClient(Ok("no json here".to_string()))));
        assert!(agent.generate(Utc::now()).await.is_none());
        assert_eq!(agent.current_action(), "Code generation failed");
        assert!(agent.memory().recent(1)[0].contains("Failed to extract valid JSON"));
    }

    #[tokio::test]
    async fn test_network_failure_yields_none() {
        let mut agent = generator(Arc::new(FixedClient(Err(|| {
            LlmError::Connection("refused".to_string())
        }))));
        assert!(agent.generate(Utc::now()).await.is_none());
        assert!(agent.memory().recent(1)[0].contains("connection failed"));
    }
}
