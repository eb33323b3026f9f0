//! Summary report generation.
//!
//! This module renders a [`Report`] as JSON (the external record format),
//! Markdown or plain text.

use crate::analysis::{empty_trial_sets, total_responses, AggregateOptions};
use crate::models::{Report, ReportMetadata, TrialOutcome, NO_RESPONSES_MESSAGE};
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;

impl Report {
    /// Build a report for the given outcomes.
    pub fn new(source: &str, outcomes: Vec<TrialOutcome>, options: &AggregateOptions) -> Self {
        let metadata = ReportMetadata {
            source: source.to_string(),
            generated_at: Utc::now(),
            trial_sets: outcomes.len(),
            total_responses: total_responses(&outcomes),
            empty_trial_sets: empty_trial_sets(&outcomes),
            decimals: options.decimals,
            rounding: options.rounding,
        };

        Self { metadata, outcomes }
    }
}

/// Generate the JSON report: an array with one record per trial set.
pub fn generate_json_report(report: &Report, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(&report.outcomes)
    } else {
        serde_json::to_string(&report.outcomes)
    };

    json.context("Failed to serialize summary records")
}

/// Generate a Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Cold Start Summary\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_table(
        &report.outcomes,
        report.metadata.decimals,
    ));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Trial Sets:** {}\n", metadata.trial_sets));
    section.push_str(&format!(
        "- **Total Responses:** {}\n",
        metadata.total_responses
    ));
    if metadata.empty_trial_sets > 0 {
        section.push_str(&format!(
            "- **Trial Sets Without Responses:** {}\n",
            metadata.empty_trial_sets
        ));
    }
    section.push_str(&format!(
        "- **Rounding:** {} decimals, {}\n",
        metadata.decimals, metadata.rounding
    ));
    section.push('\n');

    section
}

/// Generate the per-concurrency table.
fn generate_summary_table(outcomes: &[TrialOutcome], decimals: u32) -> String {
    let mut section = String::new();

    section.push_str("## Results\n\n");

    if outcomes.is_empty() {
        section.push_str("No trial sets in input.\n\n");
        return section;
    }

    section.push_str(
        "| Concurrency | Count | Avg Init | Max Wait | Avg Duration | Avg Total |\n",
    );
    section.push_str("|---:|---:|---:|---:|---:|---:|\n");

    let places = decimals as usize;
    for outcome in outcomes {
        match outcome {
            TrialOutcome::Summary(record) => {
                section.push_str(&format!(
                    "| {} | {} | {} | {} | {:.*} | {:.*} |\n",
                    record.concurrency,
                    record.count,
                    record.avg_init.display_with(decimals),
                    record.max_wait,
                    places,
                    record.avg_duration,
                    places,
                    record.avg_total
                ));
            }
            TrialOutcome::NoResponses { concurrency } => {
                section.push_str(&format!(
                    "| {} | 0 | - | - | - | - |\n",
                    concurrency
                ));
            }
        }
    }
    section.push('\n');

    if outcomes
        .iter()
        .any(|o| matches!(o, TrialOutcome::NoResponses { .. }))
    {
        section.push_str(&format!(
            "Rows marked `-` had {}.\n\n",
            NO_RESPONSES_MESSAGE
        ));
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*`N/A` average init: no cold start observed at that concurrency.*\n".to_string()
}

/// Generate a plain-text report, one line per trial set.
pub fn generate_text_report(report: &Report) -> String {
    let places = report.metadata.decimals as usize;

    let mut lines: Vec<String> = report
        .outcomes
        .iter()
        .map(|outcome| match outcome {
            TrialOutcome::Summary(record) => format!(
                "concurrency={} count={} avg_init={} max_wait={} avg_duration={:.*} avg_total={:.*}",
                record.concurrency,
                record.count,
                record.avg_init.display_with(report.metadata.decimals),
                record.max_wait,
                places,
                record.avg_duration,
                places,
                record.avg_total
            ),
            TrialOutcome::NoResponses { concurrency } => format!(
                "concurrency={} count=0 error=\"{}\"",
                concurrency, NO_RESPONSES_MESSAGE
            ),
        })
        .collect();

    lines.push(String::new());
    lines.join("\n")
}

/// Write rendered report content to a file.
pub fn write_report(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvgInit, SummaryRecord};

    fn create_test_report() -> Report {
        let outcomes = vec![
            TrialOutcome::Summary(SummaryRecord {
                concurrency: 2,
                count: 2,
                avg_init: AvgInit::Measured(3.0),
                max_wait: 5.0,
                avg_duration: 15.0,
                avg_total: 18.0,
            }),
            TrialOutcome::Summary(SummaryRecord {
                concurrency: 4,
                count: 3,
                avg_init: AvgInit::NotApplicable,
                max_wait: 6.0,
                avg_duration: 11.67,
                avg_total: 15.67,
            }),
            TrialOutcome::NoResponses { concurrency: 8 },
        ];

        Report::new("input.json", outcomes, &AggregateOptions::default())
    }

    #[test]
    fn test_report_metadata() {
        let report = create_test_report();

        assert_eq!(report.metadata.source, "input.json");
        assert_eq!(report.metadata.trial_sets, 3);
        assert_eq!(report.metadata.total_responses, 5);
        assert_eq!(report.metadata.empty_trial_sets, 1);
        assert_eq!(report.metadata.decimals, 2);
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["avg_init"], 3.0);
        assert_eq!(records[0]["avg_total"], 18.0);
        assert_eq!(records[1]["avg_init"], "N/A");
        assert_eq!(records[2]["error"], NO_RESPONSES_MESSAGE);
        assert!(records[2].get("max_wait").is_none());
    }

    #[test]
    fn test_generate_json_report_compact() {
        let report = create_test_report();
        let json = generate_json_report(&report, false).unwrap();

        assert!(!json.contains('\n'));
        assert!(json.starts_with("[{\"concurrency\":2,\"count\":2,\"avg_init\":3.0"));
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Cold Start Summary"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("- **Trial Sets Without Responses:** 1"));
        assert!(markdown.contains("| 2 | 2 | 3.00 | 5 | 15.00 | 18.00 |"));
        assert!(markdown.contains("| 4 | 3 | N/A | 6 | 11.67 | 15.67 |"));
        assert!(markdown.contains("| 8 | 0 | - | - | - | - |"));
    }

    #[test]
    fn test_generate_markdown_report_empty() {
        let report = Report::new("empty.json", Vec::new(), &AggregateOptions::default());
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("No trial sets in input."));
        assert!(!markdown.contains("Trial Sets Without Responses"));
    }

    #[test]
    fn test_generate_text_report() {
        let report = create_test_report();
        let text = generate_text_report(&report);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "concurrency=2 count=2 avg_init=3.00 max_wait=5 avg_duration=15.00 avg_total=18.00"
        );
        assert!(lines[1].contains("avg_init=N/A"));
        assert_eq!(
            lines[2],
            "concurrency=8 count=0 error=\"no responses recorded\""
        );
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");

        write_report(&path, "[]").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
