//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.coldstart.toml` files.

use crate::analysis::AggregateOptions;
use crate::cli::OutputFormat;
use crate::models::{EmptyPolicy, RoundingMode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".coldstart.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Aggregation settings.
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Write the report here instead of stdout.
    #[serde(default)]
    pub output: Option<String>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// How trial sets are reduced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Decimal places averages are rounded to.
    #[serde(default = "default_decimals")]
    pub decimals: u32,

    /// Rounding rule for averages.
    #[serde(default)]
    pub rounding: RoundingMode,

    /// Handling of trial sets without responses.
    #[serde(default)]
    pub empty_policy: EmptyPolicy,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
            rounding: RoundingMode::default(),
            empty_policy: EmptyPolicy::default(),
        }
    }
}

fn default_decimals() -> u32 {
    2
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            pretty: true,
        }
    }
}

fn default_true() -> bool {
    true
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
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.coldstart.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(decimals) = args.decimals {
            self.aggregation.decimals = decimals;
        }
        if let Some(rounding) = args.rounding {
            self.aggregation.rounding = rounding;
        }
        if let Some(policy) = args.empty_policy {
            self.aggregation.empty_policy = policy;
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if args.compact {
            self.report.pretty = false;
        }
    }

    /// Aggregation options derived from this configuration.
    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            decimals: self.aggregation.decimals,
            rounding: self.aggregation.rounding,
            empty_policy: self.aggregation.empty_policy,
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
    use crate::cli::Args;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.aggregation.decimals, 2);
        assert_eq!(config.aggregation.rounding, RoundingMode::HalfEven);
        assert_eq!(config.aggregation.empty_policy, EmptyPolicy::Report);
        assert_eq!(config.report.format, OutputFormat::Json);
        assert!(config.report.pretty);
        assert_eq!(config.aggregate_options(), AggregateOptions::default());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "summary.md"
verbose = true

[aggregation]
decimals = 3
rounding = "half-up"
empty_policy = "fail"

[report]
format = "markdown"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output.as_deref(), Some("summary.md"));
        assert!(config.general.verbose);
        assert_eq!(config.aggregation.decimals, 3);
        assert_eq!(config.aggregation.rounding, RoundingMode::HalfUp);
        assert_eq!(config.aggregation.empty_policy, EmptyPolicy::Fail);
        assert_eq!(config.report.format, OutputFormat::Markdown);
        assert!(config.report.pretty);
    }

    #[test]
    fn test_parse_invalid_policy() {
        let toml_content = r#"
[aggregation]
empty_policy = "ignore"
"#;
        assert!(toml::from_str::<Config>(toml_content).is_err());
    }

    #[test]
    fn test_merge_only_explicit_args() {
        let mut config: Config = toml::from_str(
            r#"
[aggregation]
decimals = 4
rounding = "half-up"

[report]
format = "text"
"#,
        )
        .unwrap();

        let args =
            Args::try_parse_from(["coldstart-summary", "in.json", "--empty-policy", "fail", "--compact"])
                .unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.aggregation.decimals, 4);
        assert_eq!(config.aggregation.rounding, RoundingMode::HalfUp);
        assert_eq!(config.aggregation.empty_policy, EmptyPolicy::Fail);
        assert_eq!(config.report.format, OutputFormat::Text);
        assert!(!config.report.pretty);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[aggregation]\ndecimals = 1\n",
        )
        .unwrap();

        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.aggregation.decimals, 1);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[aggregation\ndecimals = ").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[aggregation]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.aggregation.decimals, 2);
    }
}
