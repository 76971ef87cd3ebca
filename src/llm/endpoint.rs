//! The completion endpoint contract.

use async_trait::async_trait;
use thiserror::Error;

/// Errors a completion endpoint can return. None of them are retried.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("cannot connect to completion endpoint at {0}")]
    Connect(String),

    #[error("completion API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to send request: {0}")]
    Request(String),

    #[error("malformed completion response: {0}")]
    Malformed(String),

    #[error("completion response contained no choices")]
    EmptyResponse,
}

/// One completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Fully rendered instruction.
    pub prompt: String,
    /// Model identifier.
    pub model: String,
    pub temperature: f32,
    /// Maximum output length in tokens.
    pub max_tokens: u32,
}

/// Something that turns an instruction into generated text.
#[async_trait]
pub trait CompletionEndpoint: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}
