//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation.

use crate::models::ModelChoice;
use clap::Parser;
use std::path::PathBuf;

/// Smarter GPT - ask once, answer carefully
///
/// Asks the model the same question several times, has it double-check
/// each answer, compares the answers and prints a concise best answer.
///
/// Examples:
///   smarter-gpt "How long would 30 shirts take to dry if 5 take 5 hours?"
///   smarter-gpt --model gpt-3.5-turbo -n 3 "Why is the sky blue?"
///   smarter-gpt --show-intermediate --output answer.md "What is 2+2?"
///   smarter-gpt --dry-run "What is 2+2?"
///   smarter-gpt --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Question to answer
    ///
    /// Read from stdin when omitted.
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// Model to use for every call
    #[arg(short, long, env = "SMARTER_GPT_MODEL")]
    pub model: Option<ModelChoice>,

    /// Number of ask-then-double-check passes
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub repetitions: Option<usize>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Maximum tokens per completion
    #[arg(long, value_name = "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, value_name = "URL", env = "OPENAI_BASE_URL")]
    pub api_url: Option<String>,

    /// API key for the completion endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Request timeout in seconds (default: no timeout)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Compare only the double-checked answers
    #[arg(long)]
    pub checked_only: bool,

    /// Run the repetitions concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Print the initial and checked answers before the final answer
    #[arg(long)]
    pub show_intermediate: bool,

    /// Also save a report of the run to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Dry run: compose every prompt without calling the API
    ///
    /// Each step "answers" with its own prompt, so the output shows exactly
    /// what would be sent. No API key needed.
    #[arg(long)]
    pub dry_run: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .smarter-gpt.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Generate a default .smarter-gpt.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (answer only)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the saved report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if self.repetitions == Some(0) {
            return Err("Repetitions must be at least 1".to_string());
        }

        if self.max_tokens == Some(0) {
            return Err("Max tokens must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }
}
