//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{EmptyPolicy, RoundingMode};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest number of decimals that still means something for an f64.
const MAX_DECIMALS: u32 = 15;

/// Coldstart Summary - per-concurrency cold-start latency summaries
///
/// Reads the JSON written by the serverless benchmark driver and prints
/// one summary per concurrency level: average init time, max wait time,
/// average duration and average total latency.
///
/// Examples:
///   coldstart-summary input_wasm_prewarmed.json
///   coldstart-summary results.json --format markdown -o summary.md
///   cat results.json | coldstart-summary - --compact
///   coldstart-summary --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Benchmark driver output (JSON array of trial sets), or `-` for stdin
    #[arg(
        value_name = "FILE",
        default_value = "input_wasm_prewarmed.json",
        env = "COLDSTART_INPUT"
    )]
    pub input: PathBuf,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (json, markdown, text)
    ///
    /// Default: from config or json.
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Decimal places averages are rounded to
    ///
    /// Default: from config or 2.
    #[arg(long, value_name = "N")]
    pub decimals: Option<u32>,

    /// Rounding rule for averages (half-even, half-up)
    #[arg(long, value_name = "MODE")]
    pub rounding: Option<RoundingMode>,

    /// What to do with trial sets that have no responses
    ///
    /// report: emit an error record for that trial set and continue.
    /// fail: reject the whole input (exit code 2).
    #[arg(long, value_name = "POLICY")]
    pub empty_policy: Option<EmptyPolicy>,

    /// Emit single-line JSON
    #[arg(long)]
    pub compact: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .coldstart.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .coldstart.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON array of summary records (default)
    #[default]
    Json,
    /// Markdown table
    Markdown,
    /// One line per concurrency level
    Text,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether the input should be read from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.input == Path::new("-")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(decimals) = self.decimals {
            if decimals > MAX_DECIMALS {
                return Err(format!("Decimals must be at most {}", MAX_DECIMALS));
            }
        }

        if !self.reads_stdin() {
            if !self.input.exists() {
                return Err(format!(
                    "Input file does not exist: {}",
                    self.input.display()
                ));
            }
            if !self.input.is_file() {
                return Err(format!(
                    "Input path is not a file: {}",
                    self.input.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `verbose_by_default` comes from the config file; `--quiet` still wins.
    pub fn log_level(&self, verbose_by_default: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || verbose_by_default {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
