//! Configuration file handling.
//!
//! This module handles loading `.smarter-gpt.toml` and merging it with
//! command-line arguments.

use crate::models::{ComparisonInput, ModelChoice};
use crate::pipeline::PipelineSettings;
use crate::prompts::PromptStep;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".smarter-gpt.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model and endpoint settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Workflow settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Per-step template overrides.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub prompts: BTreeMap<PromptStep, String>,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Print intermediate answers before the final one.
    #[serde(default)]
    pub show_intermediate: bool,
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model used for every call.
    #[serde(default)]
    pub name: ModelChoice,

    /// Base URL of the completion API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: ModelChoice::default(),
            api_url: default_api_url(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: None,
        }
    }
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.9
}

fn default_max_tokens() -> u32 {
    500
}

/// Workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Ask-then-double-check passes.
    #[serde(default = "default_repetitions")]
    pub repetitions: usize,

    /// Which answers feed the comparison (`all` or `checked-only`).
    #[serde(default)]
    pub comparison_input: ComparisonInput,

    /// Run repetitions concurrently.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            repetitions: default_repetitions(),
            comparison_input: ComparisonInput::default(),
            parallel: false,
        }
    }
}

fn default_repetitions() -> usize {
    2
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given on the command line override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(model) = args.model {
            self.model.name = model;
        }
        if let Some(ref api_url) = args.api_url {
            self.model.api_url = api_url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(max_tokens) = args.max_tokens {
            self.model.max_tokens = max_tokens;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = Some(timeout);
        }

        if let Some(repetitions) = args.repetitions {
            self.pipeline.repetitions = repetitions;
        }
        if args.checked_only {
            self.pipeline.comparison_input = ComparisonInput::CheckedOnly;
        }
        if args.parallel {
            self.pipeline.parallel = true;
        }

        if args.verbose {
            self.general.verbose = true;
        }
        if args.show_intermediate {
            self.general.show_intermediate = true;
        }
    }

    /// Log level after merging: quiet wins, then `verbose` from file or flag.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Resolve the API key: explicit value first, then the configured env var.
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::to_string)
            .or_else(|| std::env::var(&self.model.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Settings handed to the pipeline.
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            model: self.model.name,
            temperature: self.model.temperature,
            max_tokens: self.model.max_tokens,
            repetitions: self.pipeline.repetitions,
            comparison_input: self.pipeline.comparison_input,
            parallel: self.pipeline.parallel,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Args, OutputFormat};
    use std::io::Write;

    fn empty_args() -> Args {
        Args {
            question: None,
            model: None,
            repetitions: None,
            temperature: None,
            max_tokens: None,
            api_url: None,
            api_key: None,
            timeout: None,
            checked_only: false,
            parallel: false,
            show_intermediate: false,
            output: None,
            format: OutputFormat::Markdown,
            dry_run: false,
            config: None,
            init_config: false,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.name, ModelChoice::Gpt4);
        assert_eq!(config.model.temperature, 0.9);
        assert_eq!(config.model.max_tokens, 500);
        assert_eq!(config.model.timeout_seconds, None);
        assert_eq!(config.pipeline.repetitions, 2);
        assert_eq!(config.pipeline.comparison_input, ComparisonInput::All);
        assert!(config.prompts.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
show_intermediate = true

[model]
name = "gpt-3.5-turbo"
temperature = 0.2
timeout_seconds = 60

[pipeline]
repetitions = 3
comparison_input = "checked-only"
parallel = true

[prompts]
summary = "In one sentence: {final_answer}"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.show_intermediate);
        assert_eq!(config.model.name, ModelChoice::Gpt35Turbo);
        assert_eq!(config.model.temperature, 0.2);
        assert_eq!(config.model.timeout_seconds, Some(60));
        assert_eq!(config.model.max_tokens, 500);
        assert_eq!(config.pipeline.repetitions, 3);
        assert_eq!(
            config.pipeline.comparison_input,
            ComparisonInput::CheckedOnly
        );
        assert!(config.pipeline.parallel);
        assert_eq!(
            config.prompts.get(&PromptStep::Summary).map(String::as_str),
            Some("In one sentence: {final_answer}")
        );
    }

    #[test]
    fn test_unknown_model_in_file_rejected() {
        let result: Result<Config, _> = toml::from_str("[model]\nname = \"llama3\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline]\nrepetitions = 4").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.pipeline.repetitions, 4);
        assert_eq!(config.model.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_merge_only_overrides_given_flags() {
        let mut config: Config =
            toml::from_str("[model]\nname = \"gpt-3.5-turbo\"\n[pipeline]\nrepetitions = 5\n")
                .unwrap();

        let mut args = empty_args();
        args.checked_only = true;
        args.temperature = Some(0.3);
        config.merge_with_args(&args);

        assert_eq!(config.model.name, ModelChoice::Gpt35Turbo);
        assert_eq!(config.pipeline.repetitions, 5);
        assert_eq!(config.model.temperature, 0.3);
        assert_eq!(
            config.pipeline.comparison_input,
            ComparisonInput::CheckedOnly
        );

        let settings = config.pipeline_settings();
        assert_eq!(settings.repetitions, 5);
        assert_eq!(settings.model, ModelChoice::Gpt35Turbo);
    }

    #[test]
    fn test_verbose_from_file_sets_debug_level() {
        let mut config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        config.merge_with_args(&empty_args());

        assert_eq!(config.log_level(false), tracing::Level::DEBUG);
        assert_eq!(config.log_level(true), tracing::Level::ERROR);

        let mut config = Config::default();
        assert_eq!(config.log_level(false), tracing::Level::INFO);

        let mut args = empty_args();
        args.verbose = true;
        config.merge_with_args(&args);
        assert_eq!(config.log_level(false), tracing::Level::DEBUG);
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let mut config = Config::default();
        config.model.api_key_env = "SMARTER_GPT_TEST_UNSET_KEY_VAR".to_string();

        assert_eq!(config.resolve_api_key(Some("sk-cli")), Some("sk-cli".to_string()));
        assert_eq!(config.resolve_api_key(None), None);
        assert_eq!(config.resolve_api_key(Some("  ")), None);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("[pipeline]"));
        assert!(toml_str.contains("name = \"gpt-4\""));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.pipeline.repetitions, 2);
    }
}
