//! Data models for cold-start summaries.
//!
//! This module contains the input records produced by the benchmark
//! driver (trial sets, responses, annotations) and the summary records
//! and report structures produced from them.

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Message attached to a trial set that recorded no responses.
pub const NO_RESPONSES_MESSAGE: &str = "no responses recorded";

/// Literal emitted in place of an average when no cold start was observed.
pub const NOT_APPLICABLE: &str = "N/A";

/// A single key/value annotation recorded by the driver.
///
/// Values are kept as raw JSON: the driver records non-numeric
/// annotations (`path`, `kind`, `limits`, ...) next to the timing ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub key: String,
    pub value: serde_json::Value,
}

impl Annotation {
    /// Creates a numeric annotation.
    #[cfg(test)]
    pub fn number(key: &str, value: f64) -> Self {
        Self {
            key: key.to_string(),
            value: serde_json::json!(value),
        }
    }
}

/// One completed request's measurements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Execution time. Treated as 0 when absent.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Ordered key/value annotations. Keys may repeat; the last one wins.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// One benchmark run at a fixed concurrency level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSet {
    /// Number of concurrent requests issued.
    #[serde(rename = "no_concurrent_requests")]
    pub concurrency: u64,
    /// Completed requests, possibly fewer than `concurrency`.
    pub responses: Vec<Response>,
}

/// Average initialization latency of a trial set.
///
/// `NotApplicable` means no response in the trial set incurred a cold
/// start. It is a different fact from a measured zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AvgInit {
    Measured(f64),
    NotApplicable,
}

impl AvgInit {
    /// Formats the value with a fixed number of decimals, or `N/A`.
    pub fn display_with(&self, decimals: u32) -> String {
        match self {
            AvgInit::Measured(v) => format!("{:.*}", decimals as usize, v),
            AvgInit::NotApplicable => NOT_APPLICABLE.to_string(),
        }
    }
}

impl From<Option<f64>> for AvgInit {
    fn from(value: Option<f64>) -> Self {
        value.map_or(AvgInit::NotApplicable, AvgInit::Measured)
    }
}

impl fmt::Display for AvgInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvgInit::Measured(v) => write!(f, "{}", v),
            AvgInit::NotApplicable => write!(f, "{}", NOT_APPLICABLE),
        }
    }
}

impl Serialize for AvgInit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AvgInit::Measured(v) => serializer.serialize_f64(*v),
            AvgInit::NotApplicable => serializer.serialize_str(NOT_APPLICABLE),
        }
    }
}

/// Summary of one trial set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    /// Concurrency level of the trial set.
    pub concurrency: u64,
    /// Number of responses.
    pub count: usize,
    /// Mean of the present `initTime` values.
    pub avg_init: AvgInit,
    /// Largest `waitTime` across responses (not rounded).
    pub max_wait: f64,
    /// Mean execution duration.
    pub avg_duration: f64,
    /// Mean of per-response `waitTime + duration`.
    pub avg_total: f64,
}

/// Result of summarizing one trial set.
#[derive(Debug, Clone, PartialEq)]
pub enum TrialOutcome {
    /// The trial set had at least one response.
    Summary(SummaryRecord),
    /// The trial set had no responses; no statistic is defined.
    NoResponses { concurrency: u64 },
}

impl TrialOutcome {
    pub fn concurrency(&self) -> u64 {
        match self {
            TrialOutcome::Summary(record) => record.concurrency,
            TrialOutcome::NoResponses { concurrency } => *concurrency,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            TrialOutcome::Summary(record) => record.count,
            TrialOutcome::NoResponses { .. } => 0,
        }
    }

    /// Returns the summary record, if the trial set had responses.
    pub fn as_summary(&self) -> Option<&SummaryRecord> {
        match self {
            TrialOutcome::Summary(record) => Some(record),
            TrialOutcome::NoResponses { .. } => None,
        }
    }
}

impl Serialize for TrialOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TrialOutcome::Summary(record) => record.serialize(serializer),
            TrialOutcome::NoResponses { concurrency } => {
                let mut state = serializer.serialize_struct("TrialOutcome", 3)?;
                state.serialize_field("concurrency", concurrency)?;
                state.serialize_field("count", &0usize)?;
                state.serialize_field("error", NO_RESPONSES_MESSAGE)?;
                state.end()
            }
        }
    }
}

/// Rounding rule applied to averages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingMode {
    /// Ties go to the even neighbour (banker's rounding)
    #[default]
    HalfEven,
    /// Ties go away from zero
    HalfUp,
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundingMode::HalfEven => write!(f, "half-even"),
            RoundingMode::HalfUp => write!(f, "half-up"),
        }
    }
}

/// What to do with a trial set that has no responses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyPolicy {
    /// Emit an error record for that trial set and keep going
    #[default]
    Report,
    /// Abort the whole batch
    Fail,
}

/// Metadata about a summary report.
#[derive(Debug, Clone)]
pub struct ReportMetadata {
    /// Where the trial sets were read from.
    pub source: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of trial sets in the input.
    pub trial_sets: usize,
    /// Number of responses across all trial sets.
    pub total_responses: usize,
    /// Number of trial sets without responses.
    pub empty_trial_sets: usize,
    /// Decimal places averages are rounded to.
    pub decimals: u32,
    /// Rounding rule for averages.
    pub rounding: RoundingMode,
}

/// The complete summary report.
#[derive(Debug, Clone)]
pub struct Report {
    pub metadata: ReportMetadata,
    /// One outcome per trial set, in input order.
    pub outcomes: Vec<TrialOutcome>,
}
