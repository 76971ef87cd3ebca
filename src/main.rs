//! Smarter GPT - careful answers from an LLM
//!
//! A CLI tool that asks a completion API the same question several times,
//! has the model double-check, compare and resolve its own answers, and
//! prints a concise final answer.
//!
//! Exit codes:
//!   0 - Success (or nothing to do for an empty question)
//!   1 - Runtime error (configuration, credential, API failure, etc.)

mod cli;
mod config;
mod llm;
mod models;
mod pipeline;
mod prompts;
mod report;

use anyhow::{bail, Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE};
use llm::{CompletionEndpoint, EchoEndpoint, OpenAiClient, OpenAiConfig};
use pipeline::{Aggregator, NoProgress, ProgressNotifier};
use prompts::TemplateSet;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

const WELCOME_MSG: &str = "What's on your mind today?";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config comes first: `[general] verbose` decides the log level.
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(config.log_level(args.quiet));

    info!("smarter-gpt v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", redacted(&args));
    info!("{}", config_source);

    match run(args, config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default config file.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to change the model, repetitions or prompt templates.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so stdout only carries the answer.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Args for debug logging, without the credential.
fn redacted(args: &Args) -> Args {
    let mut args = args.clone();
    if args.api_key.is_some() {
        args.api_key = Some("***".to_string());
    }
    args
}

/// Run the complete workflow for one question.
async fn run(args: Args, config: Config) -> Result<()> {
    // Templates are validated before anything is sent.
    let templates = TemplateSet::with_overrides(&config.prompts)
        .context("Invalid prompt template in configuration")?;
    let settings = config.pipeline_settings();

    let endpoint: Arc<dyn CompletionEndpoint> = if args.dry_run {
        info!("Dry run: prompts are echoed back, no API calls are made");
        Arc::new(EchoEndpoint::new())
    } else {
        let Some(api_key) = config.resolve_api_key(args.api_key.as_deref()) else {
            bail!(
                "No API key found. Pass --api-key or set {}",
                config.model.api_key_env
            );
        };
        Arc::new(OpenAiClient::new(OpenAiConfig {
            api_url: config.model.api_url.clone(),
            api_key,
            timeout_seconds: config.model.timeout_seconds,
        })?)
    };

    let aggregator = Aggregator::new(endpoint, settings, templates)?;

    let question = match args.question {
        Some(ref question) => question.clone(),
        None => read_question()?,
    };

    let spinner = (!args.quiet).then(|| {
        report::SpinnerProgress::new(aggregator.settings().expected_calls())
    });
    let progress: &dyn ProgressNotifier = match spinner {
        Some(ref spinner) => spinner,
        None => &NoProgress,
    };

    let outcome = aggregator.run_with_progress(&question, progress).await;
    if let Some(ref spinner) = spinner {
        spinner.finish();
    }

    let Some(result) = outcome? else {
        // Empty question: nothing was asked, nothing to show.
        return Ok(());
    };

    if config.general.show_intermediate {
        print!("{}", report::render_intermediate(&result));
    }
    println!("{}", result.summary);

    if let Some(ref path) = args.output {
        report::write_report(&result, args.format, path)?;
        info!("Report saved to {}", path.display());
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so it returns a description of where the
/// config came from for the caller to log.
fn load_config(args: &Args) -> Result<(Config, String)> {
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, format!("Loaded config from: {}", config_path.display())));
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok((config, format!("Loaded default config from {}", CONFIG_FILE))),
        Ok(None) => Ok((
            Config::default(),
            "No config file found, using defaults".to_string(),
        )),
        Err(e) => {
            eprintln!("⚠️  Failed to load config, using defaults: {:#}", e);
            Ok((Config::default(), "Using default config".to_string()))
        }
    }
}

/// Prompt on stderr and read one line from stdin.
fn read_question() -> Result<String> {
    eprint!("{} ", WELCOME_MSG);
    io::stderr().flush().ok();

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read question from stdin")?;

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
