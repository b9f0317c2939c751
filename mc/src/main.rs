//! migconfig - migration topology validator and transformer
//!
//! CLI entry point. Results go to stdout, failures to stderr, logs to a file.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use schemakit::{Violation, format_blocks};
use serde::Serialize;
use tracing::{debug, info, warn};

use migconfig::cli::{Cli, Command, OutputFormat, generate_after_help};
use migconfig::config::Config;
use migconfig::error::{PipelineError, error_chain};
use migconfig::latch::{LatchStore, MemoryLatchStore, target_latches};
use migconfig::pipeline::{Pipeline, lock_document};
use migconfig::reader::{DocumentSource, load_document};
use migconfig::resolver::LocalEndpointResolver;
use migconfig::transform::MigrationConfigTransformer;

fn parse_level(level: &str) -> Option<tracing::Level> {
    match level.to_uppercase().as_str() {
        "TRACE" => Some(tracing::Level::TRACE),
        "DEBUG" => Some(tracing::Level::DEBUG),
        "INFO" => Some(tracing::Level::INFO),
        "WARN" | "WARNING" => Some(tracing::Level::WARN),
        "ERROR" => Some(tracing::Level::ERROR),
        _ => None,
    }
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("migconfig")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level_str = cli_log_level.or(config_log_level);
    let parsed = level_str.map(|s| (s, parse_level(s)));
    let level = match parsed {
        Some((_, Some(level))) => level,
        _ => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("migconfig.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    if let Some((s, None)) = parsed {
        warn!(level = %s, "Unknown log-level, defaulting to INFO");
    }
    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cmd = Cli::command().after_help(generate_after_help());

    let cli = match Cli::from_arg_matches(&cmd.get_matches()) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    let error_format = cli.command.error_format();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => report_failure(&report, error_format),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Transform { input, pretty, .. } => {
            debug!(%input, pretty, "main: matched Transform command");
            cmd_transform(&config, &input, pretty || config.output.pretty).await
        }
        Command::LockSchema { input, schema, .. } => {
            debug!(%input, ?schema, "main: matched LockSchema command");
            let raw = load_document(&DocumentSource::from_arg(&input)).map_err(PipelineError::from)?;
            let locked = lock_document(&raw, schema)?;
            print_json(&locked, true)
        }
        Command::Schema { schema } => {
            debug!(?schema, "main: matched Schema command");
            print_json(&schema.schema().to_json_schema_document(), true)
        }
        Command::Latches { input, .. } => {
            debug!(%input, "main: matched Latches command");
            cmd_latches(&config, &input).await
        }
    }
}

fn build_pipeline(config: &Config) -> Pipeline {
    let mut endpoints = LocalEndpointResolver::default();
    if let Some(timeout) = config.resolver.timeout() {
        debug!(?timeout, "build_pipeline: resolver timeout set");
        endpoints = endpoints.with_timeout(timeout);
    }
    Pipeline::new(MigrationConfigTransformer::new(endpoints))
}

/// Run the pipeline and print the parameterized configs
async fn cmd_transform(config: &Config, input: &str, pretty: bool) -> Result<()> {
    debug!(%input, pretty, "cmd_transform: called");
    let configs = build_pipeline(config)
        .process_path(&DocumentSource::from_arg(input))
        .await?;
    info!(count = configs.len(), "Writing parameterized configs");
    print_json(&configs, pretty)
}

/// Run the pipeline, seed an in-memory latch store and print its counts
async fn cmd_latches(config: &Config, input: &str) -> Result<()> {
    debug!(%input, "cmd_latches: called");
    let configs = build_pipeline(config)
        .process_path(&DocumentSource::from_arg(input))
        .await?;
    let store = MemoryLatchStore::new();
    store.seed(target_latches(&configs)).await;
    print_json(&store.snapshot().await, true)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

/// Print a failure on stderr and pick the exit code
fn report_failure(report: &eyre::Report, format: OutputFormat) -> ExitCode {
    let (header, violations, code) = match report.downcast_ref::<PipelineError>() {
        Some(err) => (err.category().to_string(), err.violations(), err.exit_code()),
        None => {
            let root: &(dyn std::error::Error + 'static) = report.as_ref();
            (
                "error".to_string(),
                vec![Violation::new(Vec::new(), error_chain(root))],
                1,
            )
        }
    };
    debug!(code, count = violations.len(), "report_failure: called");

    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(&violations) {
            Ok(json) => eprintln!("{}", json),
            Err(_) => eprintln!("{}", format_blocks(&violations)),
        },
        OutputFormat::Text => {
            eprintln!("{} {}", "error:".red().bold(), header);
            eprintln!("{}", format_blocks(&violations));
        }
    }
    ExitCode::from(code as u8)
}
