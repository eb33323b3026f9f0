//! Coldstart Summary - serverless cold-start benchmark aggregator
//!
//! A CLI tool that reads the per-request timing records written by a
//! serverless benchmark driver and reports, per concurrency level, the
//! average init time, max wait time, average duration and average total
//! latency.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (I/O, config, rendering)
//!   2 - Input rejected (malformed input, or an empty trial set under
//!       the `fail` empty policy)

mod analysis;
mod cli;
mod config;
mod error;
mod input;
mod models;
mod report;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::Config;
use error::{AggregateError, InputError};
use models::{Report, TrialSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is read before logging so its `verbose` setting applies.
    let loaded = load_config(&args);
    let config_verbose = loaded
        .as_ref()
        .is_ok_and(|(config, _)| config.general.verbose);
    init_logging(args.log_level(config_verbose));

    info!("Coldstart Summary v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let result = loaded.and_then(|(config, origin)| {
        origin.log();
        run(args, config)
    });

    if let Err(e) = result {
        error!("Summary failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(exit_code_for(&e));
    }

    Ok(())
}

/// Handle --init-config: generate a default .coldstart.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  .coldstart.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .coldstart.toml")?;

    println!("✅ Created .coldstart.toml with default settings.");
    println!("   Edit it to customize rounding, the empty trial set policy and the report format.");
    Ok(())
}

/// Initialize logging at `level`, unless `RUST_LOG` says otherwise.
///
/// Logs go to stderr so stdout only carries the report.
fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(level).into())
    });

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load, summarize and render one driver output.
fn run(args: Args, mut config: Config) -> Result<()> {
    let start_time = Instant::now();

    config.merge_with_args(&args);
    let options = config.aggregate_options();

    let (source, trial_sets) = load_input(&args)?;
    info!("Loaded {} trial sets from {}", trial_sets.len(), source);

    let outcomes = analysis::aggregate(&trial_sets, &options)?;
    let report = Report::new(&source, outcomes, &options);

    if report.metadata.empty_trial_sets > 0 {
        let levels: Vec<String> = report
            .outcomes
            .iter()
            .filter(|o| o.as_summary().is_none())
            .map(|o| o.concurrency().to_string())
            .collect();
        warn!(
            "{} of {} trial sets had no responses (concurrency {})",
            report.metadata.empty_trial_sets,
            report.metadata.trial_sets,
            levels.join(", ")
        );
    }

    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&report, config.report.pretty)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
        OutputFormat::Text => report::generate_text_report(&report),
    };

    match config.general.output.as_deref() {
        Some(path) => {
            let path = PathBuf::from(path);
            report::write_report(&path, &output)?;
            info!(
                "Summarized {} responses in {:.1}ms",
                report.metadata.total_responses,
                start_time.elapsed().as_secs_f64() * 1000.0
            );
            if !args.quiet {
                println!("✅ Summary saved to: {}", path.display());
            }
        }
        None => {
            println!("{}", output.trim_end());
            debug!(
                "Summarized {} responses in {:.1}ms",
                report.metadata.total_responses,
                start_time.elapsed().as_secs_f64() * 1000.0
            );
        }
    }

    Ok(())
}

/// Read trial sets from the input file or stdin.
fn load_input(args: &Args) -> Result<(String, Vec<TrialSet>)> {
    if args.reads_stdin() {
        let trial_sets = input::read_stdin_trial_sets()?;
        return Ok(("<stdin>".to_string(), trial_sets));
    }

    let trial_sets = input::load_trial_sets(&args.input)?;
    Ok((args.input.display().to_string(), trial_sets))
}

/// Where the configuration came from.
enum ConfigOrigin {
    Explicit(PathBuf),
    DefaultFile,
    Defaults,
    DefaultFileInvalid(anyhow::Error),
}

impl ConfigOrigin {
    /// Logged once the subscriber is installed.
    fn log(&self) {
        match self {
            ConfigOrigin::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigOrigin::DefaultFile => {
                info!("Loaded default config from {}", config::CONFIG_FILE_NAME)
            }
            ConfigOrigin::Defaults => debug!("No config file found, using defaults"),
            ConfigOrigin::DefaultFileInvalid(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigOrigin::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigOrigin::Defaults)),
        Err(e) => Ok((Config::default(), ConfigOrigin::DefaultFileInvalid(e))),
    }
}

/// Map a failure to the process exit code.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    let rejected = err.chain().any(|cause| {
        cause
            .downcast_ref::<InputError>()
            .is_some_and(InputError::is_rejection)
            || cause.is::<AggregateError>()
    });

    if rejected {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_for_rejected_input() {
        let err = anyhow::Error::new(InputError::NotAnArray);
        assert_eq!(exit_code_for(&err), 2);

        let err = anyhow::Error::new(AggregateError::EmptyTrialSet {
            index: 0,
            concurrency: 1,
        })
        .context("while summarizing");
        assert_eq!(exit_code_for(&err), 2);
    }

    #[test]
    fn test_exit_code_for_runtime_error() {
        let err = anyhow::anyhow!("disk full");
        assert_eq!(exit_code_for(&err), 1);
    }

    #[test]
    fn test_exit_code_for_unreadable_input() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("in.json");

        let err = anyhow::Error::new(input::load_trial_sets(&missing).unwrap_err())
            .context("while loading input");
        assert_eq!(exit_code_for(&err), 1);
    }

    #[test]
    fn test_config_file_verbose_raises_log_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verbose.toml");
        std::fs::write(&path, "[general]\nverbose = true\n").unwrap();

        let mut args = <Args as clap::Parser>::try_parse_from([
            "coldstart-summary",
            "-",
            "--config",
            path.to_str().unwrap(),
        ])
        .unwrap();

        let (config, _) = load_config(&args).unwrap();
        assert!(config.general.verbose);
        assert_eq!(
            args.log_level(config.general.verbose),
            tracing::Level::DEBUG
        );

        args.quiet = true;
        assert_eq!(
            args.log_level(config.general.verbose),
            tracing::Level::ERROR
        );
    }

    #[test]
    fn test_sample_fixture_end_to_end() {
        let trial_sets = input::parse_trial_sets(include_str!("../fixtures/input_sample.json"))
            .unwrap();
        let options = analysis::AggregateOptions::default();
        let outcomes = analysis::aggregate(&trial_sets, &options).unwrap();
        let report = Report::new("input_sample.json", outcomes, &options);

        let json = report::generate_json_report(&report, false).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"[{"concurrency":2,"count":2,"avg_init":3.0,"max_wait":5.0,"avg_duration":15.0,"avg_total":18.0},"#,
                r#"{"concurrency":4,"count":3,"avg_init":"N/A","max_wait":6.0,"avg_duration":11.67,"avg_total":15.67},"#,
                r#"{"concurrency":8,"count":0,"error":"no responses recorded"}]"#
            )
        );
    }
}
