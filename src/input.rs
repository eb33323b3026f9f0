//! Loading benchmark driver output.
//!
//! The driver writes a JSON array of trial sets. Each entry is validated
//! on its own so that a rejection names the offending trial set and field.
//! The whole batch is rejected on the first malformed entry.

use crate::error::InputError;
use crate::models::TrialSet;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Fields every trial set must carry.
const REQUIRED_FIELDS: [&str; 2] = ["no_concurrent_requests", "responses"];

/// Parse trial sets from a JSON string.
pub fn parse_trial_sets(content: &str) -> Result<Vec<TrialSet>, InputError> {
    let document: Value = serde_json::from_str(content).map_err(InputError::from_json)?;
    from_document(document)
}

/// Parse trial sets from a reader.
pub fn read_trial_sets<R: Read>(reader: R) -> Result<Vec<TrialSet>, InputError> {
    let document: Value = serde_json::from_reader(reader).map_err(InputError::from_json)?;
    from_document(document)
}

/// Read all of stdin and parse it as trial sets.
pub fn read_stdin_trial_sets() -> Result<Vec<TrialSet>, InputError> {
    let content = std::io::read_to_string(std::io::stdin()).map_err(InputError::Read)?;
    parse_trial_sets(&content)
}

/// Load trial sets from a JSON file.
pub fn load_trial_sets(path: &Path) -> Result<Vec<TrialSet>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let trial_sets = read_trial_sets(BufReader::new(file))?;
    debug!(
        "Loaded {} trial sets from {}",
        trial_sets.len(),
        path.display()
    );

    Ok(trial_sets)
}

fn from_document(document: Value) -> Result<Vec<TrialSet>, InputError> {
    let Value::Array(entries) = document else {
        return Err(InputError::NotAnArray);
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| parse_trial_set(index, entry))
        .collect()
}

fn parse_trial_set(index: usize, entry: Value) -> Result<TrialSet, InputError> {
    let Some(object) = entry.as_object() else {
        return Err(InputError::NotAnObject { index });
    };

    if let Some(field) = REQUIRED_FIELDS
        .into_iter()
        .find(|field| !object.contains_key(*field))
    {
        return Err(InputError::MissingField { index, field });
    }

    let trial_set: TrialSet =
        serde_json::from_value(entry).map_err(|source| InputError::Malformed { index, source })?;

    if trial_set.concurrency == 0 {
        return Err(InputError::InvalidConcurrency { index });
    }

    Ok(trial_set)
}
