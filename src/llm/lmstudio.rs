//! OpenAI-compatible chat-completions client (LM Studio).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{ChatMessage, ChatOptions, LlmClient, LlmError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for an OpenAI-style `/v1/chat/completions` endpoint.
pub struct LmStudioClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

impl LmStudioClient {
    /// Create a client for the given chat-completions URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl LlmClient for LmStudioClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<String, LlmError> {
        let mut payload = json!({
            "model": model,
            "messages": messages,
        });
        if let Some(temperature) = options.temperature {
            payload["temperature"] = json!(temperature);
        }

        tracing::debug!(url = %self.url, model, "sending chat completion request");

        let response = self
            .client
            .post(&self.url)
            .timeout(options.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .json(&payload)
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Status(status.as_u16()));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        match body.choices.into_iter().next() {
            Some(choice) => Ok(choice.message.content.trim().to_string()),
            None => Err(LlmError::MalformedResponse(
                "response carried no choices".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_response_parses() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":" hello "}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, " hello ");
    }

    #[test]
    fn test_empty_choices_is_malformed() {
        let raw = r#"{"object":"chat.completion"}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
