//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::schemas::SchemaId;

/// migconfig - migration topology validator and transformer
#[derive(Parser)]
#[command(
    name = "migconfig",
    about = "Validate migration topologies and expand them into per-binding workflow configs",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate and transform a migration document into parameterized configs
    Transform {
        /// Document to read, `-` for stdin
        #[arg(default_value = "-")]
        input: String,

        /// How failures are printed on stderr
        #[arg(short = 'e', long, default_value = "text")]
        error_format: OutputFormat,

        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Print the locked JSON Schema of a valid document
    LockSchema {
        /// Document to read, `-` for stdin
        #[arg(default_value = "-")]
        input: String,

        /// General schema the document must satisfy
        #[arg(short, long, value_enum, default_value = "migration-config")]
        schema: SchemaId,

        /// How failures are printed on stderr
        #[arg(short = 'e', long, default_value = "text")]
        error_format: OutputFormat,
    },

    /// Print a general schema as JSON Schema
    Schema {
        #[arg(short, long, value_enum, default_value = "migration-config")]
        schema: SchemaId,
    },

    /// Transform a document and print the per-target latch counts
    Latches {
        /// Document to read, `-` for stdin
        #[arg(default_value = "-")]
        input: String,

        /// How failures are printed on stderr
        #[arg(short = 'e', long, default_value = "text")]
        error_format: OutputFormat,
    },
}

impl Command {
    /// Error format for subcommands that read a document
    pub fn error_format(&self) -> OutputFormat {
        match self {
            Command::Transform { error_format, .. }
            | Command::LockSchema { error_format, .. }
            | Command::Latches { error_format, .. } => *error_format,
            Command::Schema { .. } => OutputFormat::Text,
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("migconfig")
        .join("logs")
        .join("migconfig.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let mut help = String::new();
    help.push_str("Exit codes:\n");
    help.push_str("  1  runtime error\n");
    help.push_str("  3  parse error\n");
    help.push_str("  4  schema validation failed\n");
    help.push_str("  5  transformation failed\n");
    help.push_str("  6  i/o or name resolution failed\n");
    help.push('\n');
    help.push_str(&format!("Logs are written to: {}", get_log_path().display()));
    help
}

/// Failure output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use text or json", s))
            }
        }
    }
}
