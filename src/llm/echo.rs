//! Offline endpoint that answers every prompt with the prompt itself.
//!
//! Backs `--dry-run`: running the chain against it shows exactly what
//! each step would send without touching the network.

use super::endpoint::{CompletionEndpoint, CompletionError, CompletionRequest};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct EchoEndpoint {
    calls: AtomicUsize,
}

impl EchoEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of prompts echoed so far.
    #[allow(dead_code)] // Checked by tests
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionEndpoint for EchoEndpoint {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(request.prompt.clone())
    }
}
