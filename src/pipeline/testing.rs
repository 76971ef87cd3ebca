//! Test doubles for the pipeline.

use super::progress::ProgressNotifier;
use crate::llm::{CompletionEndpoint, CompletionError, CompletionRequest};
use crate::models::Stage;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Echo,
    Sentinels,
}

/// Endpoint stub that records prompts and answers deterministically.
///
/// In sentinel mode the k-th initial prompt gets `raw-k`, a double-check of
/// `raw-k` gets `checked-k`, and the synthesis steps get `comparison`,
/// `final` and `summary`.
pub(crate) struct ScriptedEndpoint {
    mode: Mode,
    calls: AtomicUsize,
    initial_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    fail_at: Option<usize>,
    staggered: bool,
}

impl ScriptedEndpoint {
    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
            initial_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            fail_at: None,
            staggered: false,
        }
    }

    pub(crate) fn echo() -> Self {
        Self::with_mode(Mode::Echo)
    }

    pub(crate) fn sentinels() -> Self {
        Self::with_mode(Mode::Sentinels)
    }

    /// Fail the call with this zero-based index.
    pub(crate) fn failing_at(mut self, call: usize) -> Self {
        self.fail_at = Some(call);
        self
    }

    /// Make earlier initial prompts answer later than later ones.
    pub(crate) fn with_staggered_delays(mut self) -> Self {
        self.staggered = true;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn sentinel(&self, prompt: &str) -> (String, Option<usize>) {
        if prompt.starts_with("Answer the following") {
            let k = self.initial_calls.fetch_add(1, Ordering::SeqCst);
            (format!("raw-{}", k), Some(k))
        } else if prompt.starts_with("You are given") {
            let k = prompt
                .rsplit("raw-")
                .next()
                .and_then(|n| n.trim().parse::<usize>().ok())
                .unwrap_or(usize::MAX);
            (format!("checked-{}", k), None)
        } else if prompt.starts_with("You are a researcher") {
            ("comparison".to_string(), None)
        } else if prompt.starts_with("You are a resolver") {
            ("final".to_string(), None)
        } else {
            ("summary".to_string(), None)
        }
    }
}

#[async_trait]
impl CompletionEndpoint for ScriptedEndpoint {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());

        if self.fail_at == Some(call) {
            return Err(CompletionError::Api {
                status: 429,
                body: "rate limited".to_string(),
            });
        }

        match self.mode {
            Mode::Echo => Ok(request.prompt.clone()),
            Mode::Sentinels => {
                let (answer, initial_index) = self.sentinel(&request.prompt);
                if let (true, Some(k)) = (self.staggered, initial_index) {
                    let delay = 40u64.saturating_sub(k as u64 * 15);
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Ok(answer)
            }
        }
    }
}

/// Progress notifier that remembers what it was told.
#[derive(Default)]
pub(crate) struct RecordingProgress {
    stages: Mutex<Vec<Stage>>,
    completed: AtomicUsize,
}

impl RecordingProgress {
    pub(crate) fn stages(&self) -> Vec<Stage> {
        self.stages.lock().unwrap().clone()
    }

    pub(crate) fn completed_calls(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

impl ProgressNotifier for RecordingProgress {
    fn on_stage(&self, stage: Stage) {
        self.stages.lock().unwrap().push(stage);
    }

    fn on_call_complete(&self, _stage: Stage) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}
