//! Completion endpoint access.
//!
//! The pipeline only sees the [`CompletionEndpoint`] trait; the HTTP client
//! and the offline echo endpoint implement it.

pub mod echo;
pub mod endpoint;
pub mod openai;

pub use echo::EchoEndpoint;
pub use endpoint::{CompletionEndpoint, CompletionError, CompletionRequest};
pub use openai::{OpenAiClient, OpenAiConfig};
