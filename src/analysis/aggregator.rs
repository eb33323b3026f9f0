//! Per-trial-set cold-start aggregation.
//!
//! This module reduces the responses of each trial set into a single
//! summary record: average initialization time, maximum wait time,
//! average duration and average total (wait + duration) latency.
//!
//! Extraction rules per response:
//! - `waitTime` annotation, 0 when absent
//! - `initTime` annotation, left absent when absent (no cold start)
//! - `duration` field, 0 when absent
//! - total is `wait + duration` of that same response
//!
//! Averages are rounded to [`AggregateOptions::decimals`] places with the
//! configured [`RoundingMode`]. The maximum wait is reported as measured.

use crate::error::AggregateError;
use crate::models::{
    Annotation, AvgInit, EmptyPolicy, Response, RoundingMode, SummaryRecord, TrialOutcome,
    TrialSet,
};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Annotation key holding the queueing delay.
pub const WAIT_TIME_KEY: &str = "waitTime";

/// Annotation key holding the cold-start initialization delay.
pub const INIT_TIME_KEY: &str = "initTime";

/// Options controlling how trial sets are reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Decimal places averages are rounded to.
    pub decimals: u32,
    /// Rounding rule for averages.
    pub rounding: RoundingMode,
    /// Handling of trial sets without responses.
    pub empty_policy: EmptyPolicy,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            decimals: 2,
            rounding: RoundingMode::HalfEven,
            empty_policy: EmptyPolicy::Report,
        }
    }
}

/// Timing quantities extracted from one response.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ResponseMetrics {
    wait: f64,
    init: Option<f64>,
    duration: f64,
    total: f64,
}

/// Build a lookup table from ordered annotation pairs.
///
/// Keys are unique in the result; when a key repeats, the last pair wins.
pub fn annotation_map(annotations: &[Annotation]) -> HashMap<&str, &Value> {
    annotations
        .iter()
        .map(|a| (a.key.as_str(), &a.value))
        .collect()
}

/// Summarize every trial set, preserving input order.
///
/// Under [`EmptyPolicy::Fail`] the first trial set without responses
/// aborts the batch; under [`EmptyPolicy::Report`] it yields
/// [`TrialOutcome::NoResponses`] in its slot.
pub fn aggregate(
    trial_sets: &[TrialSet],
    options: &AggregateOptions,
) -> Result<Vec<TrialOutcome>, AggregateError> {
    trial_sets
        .iter()
        .enumerate()
        .map(|(index, trial_set)| summarize(index, trial_set, options))
        .collect()
}

/// Summarize a single trial set. `index` is its position in the batch.
pub fn summarize(
    index: usize,
    trial_set: &TrialSet,
    options: &AggregateOptions,
) -> Result<TrialOutcome, AggregateError> {
    let concurrency = trial_set.concurrency;

    if trial_set.responses.is_empty() {
        return match options.empty_policy {
            EmptyPolicy::Fail => Err(AggregateError::EmptyTrialSet { index, concurrency }),
            EmptyPolicy::Report => {
                warn!(
                    "Trial set {} (concurrency {}) has no responses",
                    index, concurrency
                );
                Ok(TrialOutcome::NoResponses { concurrency })
            }
        };
    }

    let metrics = trial_set
        .responses
        .iter()
        .enumerate()
        .map(|(response_index, response)| extract(index, response_index, response))
        .collect::<Result<Vec<_>, _>>()?;

    let init_times: Vec<f64> = metrics.iter().filter_map(|m| m.init).collect();
    let max_wait = metrics
        .iter()
        .map(|m| m.wait)
        .fold(f64::NEG_INFINITY, f64::max);

    let round = |value: f64| round_to(value, options.decimals, options.rounding);

    let record = SummaryRecord {
        concurrency,
        count: metrics.len(),
        avg_init: AvgInit::from(mean(&init_times).map(round)),
        max_wait,
        avg_duration: round(mean_of(&metrics, |m| m.duration)),
        avg_total: round(mean_of(&metrics, |m| m.total)),
    };

    debug!(
        "Trial set {}: concurrency={} count={} cold_starts={}",
        index,
        concurrency,
        record.count,
        init_times.len()
    );

    Ok(TrialOutcome::Summary(record))
}

/// Extract the timing quantities of one response.
fn extract(
    trial_set: usize,
    response_index: usize,
    response: &Response,
) -> Result<ResponseMetrics, AggregateError> {
    let annotations = annotation_map(&response.annotations);

    let numeric = |key: &str| -> Result<Option<f64>, AggregateError> {
        match annotations.get(key) {
            None => Ok(None),
            Some(value) => value.as_f64().map(Some).ok_or_else(|| {
                AggregateError::NonNumericAnnotation {
                    trial_set,
                    response: response_index,
                    key: key.to_string(),
                }
            }),
        }
    };

    let wait = numeric(WAIT_TIME_KEY)?.unwrap_or(0.0);
    let init = numeric(INIT_TIME_KEY)?;
    let duration = response.duration.unwrap_or(0.0);

    Ok(ResponseMetrics {
        wait,
        init,
        duration,
        total: wait + duration,
    })
}

/// Arithmetic mean, or `None` for an empty slice.
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Arithmetic mean of one quantity over a non-empty metrics slice.
fn mean_of(metrics: &[ResponseMetrics], field: impl Fn(&ResponseMetrics) -> f64) -> f64 {
    metrics.iter().map(field).sum::<f64>() / metrics.len() as f64
}

/// Fractional digits needed to print any f64 exactly.
const EXACT_FRACTION_DIGITS: usize = 1074;

/// Round `value` to `decimals` places.
///
/// Rounding applies to the exact binary value, so a mean stored as
/// 0.025000000000000001 rounds up under either mode. `mode` only decides
/// values sitting exactly halfway between two candidates, such as 0.125.
pub fn round_to(value: f64, decimals: u32, mode: RoundingMode) -> f64 {
    let places = decimals as usize;
    if !value.is_finite() || places >= EXACT_FRACTION_DIGITS {
        return value;
    }

    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, value);
    let Some((int_part, fraction)) = exact.split_once('.') else {
        return value;
    };
    let (kept, dropped) = fraction.split_at(places);

    let tie = dropped.starts_with('5') && dropped[1..].bytes().all(|b| b == b'0');
    if !tie {
        // Not halfway: the formatter rounds the exact value to nearest.
        return parse_fixed(&format!("{:.*}", places, value), value);
    }

    let truncated = if kept.is_empty() {
        parse_fixed(int_part, value)
    } else {
        parse_fixed(&format!("{}.{}", int_part, kept), value)
    };

    let last_digit = kept
        .bytes()
        .last()
        .or_else(|| int_part.bytes().last())
        .map_or(0, |b| b.wrapping_sub(b'0'));
    let away_from_zero = match mode {
        RoundingMode::HalfEven => last_digit % 2 == 1,
        RoundingMode::HalfUp => true,
    };
    if !away_from_zero {
        return truncated;
    }

    let step = 10f64.powi(-(decimals as i32)).copysign(value);
    let bumped = truncated + step;
    parse_fixed(&format!("{:.*}", places, bumped), bumped)
}

fn parse_fixed(text: &str, fallback: f64) -> f64 {
    text.parse().unwrap_or(fallback)
}

/// Total number of responses across all outcomes.
pub fn total_responses(outcomes: &[TrialOutcome]) -> usize {
    outcomes.iter().map(TrialOutcome::count).sum()
}

/// Number of outcomes for trial sets without responses.
pub fn empty_trial_sets(outcomes: &[TrialOutcome]) -> usize {
    outcomes
        .iter()
        .filter(|o| matches!(o, TrialOutcome::NoResponses { .. }))
        .count()
}
