//! LLM client module for interacting with language models.
//!
//! This module provides a trait-based abstraction over LLM providers,
//! with an OpenAI-compatible endpoint (LM Studio) as the primary
//! implementation. The collaborator is treated as an untrusted, fallible
//! network dependency: timeouts, connection failures, and malformed
//! responses are expected outcomes surfaced as [`LlmError`].

mod error;
mod lmstudio;

pub use error::LlmError;
pub use lmstudio::LmStudioClient;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Optional parameters for chat completions.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Sampling temperature (0 = deterministic).
    pub temperature: Option<f64>,
    /// Per-request timeout; a lapse is reported as [`LlmError::Timeout`].
    pub timeout: Option<Duration>,
}

/// Trait for LLM clients.
///
/// # Invariants
/// - `chat_completion()` never panics; every failure is an `Err(LlmError)`
/// - A call blocks its caller until it returns or times out
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a chat completion request and return the completion text.
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<String, LlmError>;
}
