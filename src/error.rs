//! Error types for loading and summarizing trial sets.

use std::path::PathBuf;
use thiserror::Error;

/// The driver output could not be turned into trial sets.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read input {}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read input")]
    Read(#[source] std::io::Error),

    #[error("input is not valid JSON")]
    Json(#[source] serde_json::Error),

    #[error("input must be a JSON array of trial sets")]
    NotAnArray,

    #[error("trial set {index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("trial set {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("trial set {index} is malformed")]
    Malformed {
        index: usize,
        source: serde_json::Error,
    },

    #[error("trial set {index} has a concurrency level of 0")]
    InvalidConcurrency { index: usize },
}

impl InputError {
    /// Whether the input was read but its content was rejected, as opposed
    /// to an I/O failure while reading it.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, InputError::Io { .. } | InputError::Read(_))
    }

    pub(crate) fn from_json(err: serde_json::Error) -> Self {
        if err.is_io() {
            InputError::Read(err.into())
        } else {
            InputError::Json(err)
        }
    }
}

/// A trial set could not be summarized.
#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    #[error("trial set {index} (concurrency {concurrency}) has no responses")]
    EmptyTrialSet { index: usize, concurrency: u64 },

    #[error("trial set {trial_set}, response {response}: annotation `{key}` is not a number")]
    NonNumericAnnotation {
        trial_set: usize,
        response: usize,
        key: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_failures_are_not_rejections() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = InputError::Io {
            path: PathBuf::from("in.json"),
            source: missing,
        };
        assert!(!err.is_rejection());

        let broken = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        assert!(!InputError::Read(broken).is_rejection());

        assert!(InputError::NotAnArray.is_rejection());
        assert!(InputError::InvalidConcurrency { index: 0 }.is_rejection());
    }

    #[test]
    fn test_messages_name_index_and_field() {
        let err = InputError::MissingField {
            index: 3,
            field: "responses",
        };
        assert_eq!(
            err.to_string(),
            "trial set 3 is missing required field `responses`"
        );

        let err = AggregateError::EmptyTrialSet {
            index: 1,
            concurrency: 16,
        };
        assert_eq!(
            err.to_string(),
            "trial set 1 (concurrency 16) has no responses"
        );
    }
}
