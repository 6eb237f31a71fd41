//! Error taxonomy for the LLM collaborator.
//!
//! Network failure, timeout, bad status, and malformed JSON are all
//! first-class, expected outcomes; nothing here is a panic path.

use thiserror::Error;

/// Errors returned by an [`LlmClient`](super::LlmClient) call.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The request did not complete within the per-request timeout.
    #[error("LLM request timed out")]
    Timeout,

    /// The endpoint could not be reached or the connection dropped.
    #[error("failed to connect to LLM: {0}")]
    Connection(String),

    /// The endpoint answered with a non-success HTTP status.
    #[error("LLM returned status {0}")]
    Status(u16),

    /// The response body did not carry the expected completion shape.
    #[error("unexpected response format from LLM: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    /// Classify a `reqwest` transport error into the taxonomy.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Connection(err.to_string())
        }
    }
}
