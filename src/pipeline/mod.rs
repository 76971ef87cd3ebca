//! The question-answering aggregator.
//!
//! A run moves through `Repeating` (ask then double-check, R times),
//! `Aggregating`, `Comparing`, `Resolving` and `Summarizing`. Every step is
//! one completion call except aggregation, and any failed call aborts the
//! run.

pub mod aggregator;
pub mod progress;
pub mod repetition;
pub mod synthesis;

#[cfg(test)]
pub(crate) mod testing;

pub use progress::{NoProgress, ProgressNotifier};

use crate::llm::{CompletionEndpoint, CompletionError, CompletionRequest};
use crate::models::{
    AnswerCollection, ComparisonInput, ModelChoice, Question, RunMetadata, RunResult, Stage,
};
use crate::prompts::{TemplateError, TemplateSet};
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("repetitions must be at least 1 (got {0})")]
    InvalidRepetitions(usize),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("completion failed during {stage}: {source}")]
    Completion {
        stage: Stage,
        #[source]
        source: CompletionError,
    },
}

/// Per-run knobs, passed in explicitly rather than read from globals.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model: ModelChoice,
    pub temperature: f32,
    pub max_tokens: u32,
    pub repetitions: usize,
    pub comparison_input: ComparisonInput,
    /// Run the repetitions concurrently. Output order is unaffected.
    pub parallel: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            model: ModelChoice::default(),
            temperature: 0.9,
            max_tokens: 500,
            repetitions: 2,
            comparison_input: ComparisonInput::All,
            parallel: false,
        }
    }
}

impl PipelineSettings {
    /// Completion calls a full run makes.
    pub fn expected_calls(&self) -> usize {
        2 * self.repetitions + synthesis::SYNTHESIS_CALLS
    }
}

/// Shared state for the calls of a single run.
pub(crate) struct RunContext<'a> {
    endpoint: &'a dyn CompletionEndpoint,
    settings: &'a PipelineSettings,
    templates: &'a TemplateSet,
    progress: &'a dyn ProgressNotifier,
    calls: AtomicUsize,
}

impl<'a> RunContext<'a> {
    pub(crate) fn templates(&self) -> &TemplateSet {
        self.templates
    }

    pub(crate) fn settings(&self) -> &PipelineSettings {
        self.settings
    }

    pub(crate) fn progress(&self) -> &dyn ProgressNotifier {
        self.progress
    }

    /// Send one rendered prompt and return the generated text.
    pub(crate) async fn ask(&self, stage: Stage, prompt: String) -> Result<String, PipelineError> {
        let request = CompletionRequest {
            prompt,
            model: self.settings.model.id().to_string(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        debug!("[{}] sending {} chars", stage, request.prompt.len());
        self.calls.fetch_add(1, Ordering::SeqCst);

        let answer = self
            .endpoint
            .complete(&request)
            .await
            .map_err(|source| PipelineError::Completion { stage, source })?;

        debug!("[{}] received {} chars", stage, answer.len());
        self.progress.on_call_complete(stage);
        Ok(answer)
    }
}

/// Runs the full ask, double-check, compare, resolve and summarize chain.
pub struct Aggregator {
    endpoint: Arc<dyn CompletionEndpoint>,
    settings: PipelineSettings,
    templates: TemplateSet,
}

impl Aggregator {
    /// Fails when the settings cannot produce a valid run.
    pub fn new(
        endpoint: Arc<dyn CompletionEndpoint>,
        settings: PipelineSettings,
        templates: TemplateSet,
    ) -> Result<Self, PipelineError> {
        if settings.repetitions == 0 {
            return Err(PipelineError::InvalidRepetitions(settings.repetitions));
        }
        templates.validate()?;

        Ok(Self {
            endpoint,
            settings,
            templates,
        })
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run with no progress reporting.
    #[allow(dead_code)] // Convenience over run_with_progress
    pub async fn run(&self, question: &str) -> Result<Option<RunResult>, PipelineError> {
        self.run_with_progress(question, &NoProgress).await
    }

    /// Returns `Ok(None)` without calling the endpoint when the question is empty.
    pub async fn run_with_progress(
        &self,
        question: &str,
        progress: &dyn ProgressNotifier,
    ) -> Result<Option<RunResult>, PipelineError> {
        let Some(question) = Question::try_new(question) else {
            info!("Empty question, nothing to do");
            return Ok(None);
        };

        let started_at = Utc::now();
        let start = Instant::now();

        let ctx = RunContext {
            endpoint: self.endpoint.as_ref(),
            settings: &self.settings,
            templates: &self.templates,
            progress,
            calls: AtomicUsize::new(0),
        };

        progress.on_stage(Stage::Init);
        info!(
            "Answering with {} ({} repetitions, comparing {} answers)",
            self.settings.model, self.settings.repetitions, self.settings.comparison_input
        );

        let outcomes = repetition::run_repetitions(&ctx, &question).await?;

        progress.on_stage(Stage::Aggregating);
        let collection = AnswerCollection::from_outcomes(&outcomes, self.settings.comparison_input);
        let aggregated = aggregator::aggregate(&collection.answers);
        info!("Aggregated {} answers", collection.len());

        let synthesis = synthesis::synthesize(&ctx, &question, &aggregated).await?;

        progress.on_stage(Stage::Done);
        let completion_calls = ctx.calls.load(Ordering::SeqCst);
        let duration_seconds = start.elapsed().as_secs_f64();
        info!(
            "Run complete: {} completion calls in {:.1}s",
            completion_calls, duration_seconds
        );

        Ok(Some(RunResult {
            metadata: RunMetadata {
                question,
                model: self.settings.model,
                repetitions: self.settings.repetitions,
                comparison_input: self.settings.comparison_input,
                started_at,
                duration_seconds,
                completion_calls,
            },
            repetitions: outcomes,
            collection,
            aggregated,
            comparison: synthesis.comparison,
            final_answer: synthesis.final_answer,
            summary: synthesis.summary,
        }))
    }
}
