//! Data models for the answer aggregator.
//!
//! This module contains the core data structures passed between the
//! pipeline stages and handed to the report writer at the end of a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A question supplied by the user.
///
/// Never empty; use [`Question::try_new`] to build one. Whitespace counts
/// as content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Question(String);

impl Question {
    /// Returns `None` only for the empty string.
    pub fn try_new(content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        if content.is_empty() {
            None
        } else {
            Some(Self(content))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Models the user can pick from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum ModelChoice {
    /// GPT-4 (default)
    #[default]
    #[serde(rename = "gpt-4")]
    #[value(name = "gpt-4")]
    Gpt4,
    /// GPT-3.5 Turbo
    #[serde(rename = "gpt-3.5-turbo")]
    #[value(name = "gpt-3.5-turbo")]
    Gpt35Turbo,
}

impl ModelChoice {
    /// Identifier sent to the completion endpoint.
    pub fn id(&self) -> &'static str {
        match self {
            ModelChoice::Gpt4 => "gpt-4",
            ModelChoice::Gpt35Turbo => "gpt-3.5-turbo",
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Which answers feed the comparison step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonInput {
    /// Raw and double-checked answer of every repetition
    #[default]
    All,
    /// Only the double-checked answers
    CheckedOnly,
}

impl fmt::Display for ComparisonInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonInput::All => write!(f, "all"),
            ComparisonInput::CheckedOnly => write!(f, "checked-only"),
        }
    }
}

/// Where a run currently is.
///
/// Stages only ever move forward: `Init`, `Repeating(0..R)`, `Aggregating`,
/// `Comparing`, `Resolving`, `Summarizing`, `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    Repeating(usize),
    Aggregating,
    Comparing,
    Resolving,
    Summarizing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Init => write!(f, "init"),
            Stage::Repeating(i) => write!(f, "repetition {}", i + 1),
            Stage::Aggregating => write!(f, "aggregating"),
            Stage::Comparing => write!(f, "comparing"),
            Stage::Resolving => write!(f, "resolving"),
            Stage::Summarizing => write!(f, "summarizing"),
            Stage::Done => write!(f, "done"),
        }
    }
}

impl Stage {
    /// Short status line for the spinner.
    pub fn status(&self) -> String {
        match self {
            Stage::Init => "Starting...".to_string(),
            Stage::Repeating(i) => format!("Asking and double-checking (pass {})...", i + 1),
            Stage::Aggregating => "Collecting answers...".to_string(),
            Stage::Comparing => "Comparing answers...".to_string(),
            Stage::Resolving => "Resolving the best answer...".to_string(),
            Stage::Summarizing => "Summarizing...".to_string(),
            Stage::Done => "Done".to_string(),
        }
    }
}

/// Result of one ask-then-double-check pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepetitionOutcome {
    /// Zero-based repetition index.
    pub index: usize,
    /// Answer to the initial question.
    pub raw: String,
    /// Answer after the double-check prompt.
    pub checked: String,
}

/// Ordered answers collected across all repetitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerCollection {
    /// Answers handed to the comparison step, in repetition order.
    pub answers: Vec<String>,
    /// Double-checked answers only, kept for diagnostic display.
    pub checked: Vec<String>,
}

impl AnswerCollection {
    /// Build the collection from outcomes sorted by repetition index.
    pub fn from_outcomes(outcomes: &[RepetitionOutcome], input: ComparisonInput) -> Self {
        let mut collection = Self::default();

        for outcome in outcomes {
            if input == ComparisonInput::All {
                collection.answers.push(outcome.raw.clone());
            }
            collection.answers.push(outcome.checked.clone());
            collection.checked.push(outcome.checked.clone());
        }

        collection
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

/// Metadata about a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// The question as typed.
    pub question: Question,
    /// Model used for every call.
    pub model: ModelChoice,
    /// Number of ask-then-double-check passes.
    pub repetitions: usize,
    /// Which answers were compared.
    pub comparison_input: ComparisonInput,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration in seconds.
    pub duration_seconds: f64,
    /// Number of completion endpoint calls made.
    pub completion_calls: usize,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub metadata: RunMetadata,
    /// Per-repetition answers, ordered by index.
    pub repetitions: Vec<RepetitionOutcome>,
    /// Answers as they were fed to the comparison step.
    pub collection: AnswerCollection,
    /// Delimited block of all compared answers.
    pub aggregated: String,
    /// Compare-and-contrast narrative.
    pub comparison: String,
    /// Resolved final answer before summarizing.
    pub final_answer: String,
    /// Text shown to the user.
    pub summary: String,
}
