//! Golden test case loading.
//!
//! The golden file is a JSON array of records:
//!
//! ```json
//! [
//!   {
//!     "input": "What is X?",
//!     "expected_output": "X is Y.",
//!     "context": ["Passage stating that X is Y."],
//!     "source_file": "docs/x.md"
//!   }
//! ]
//! ```
//!
//! `source_file` is optional; every other field is required.

use crate::error::{RagError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// A hand-curated reference example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenCase {
    /// The question.
    pub input: String,
    /// The reference answer.
    pub expected_output: String,
    /// Passages supporting the reference answer.
    pub context: Vec<String>,
    /// Document the case was derived from.
    #[serde(default)]
    pub source_file: Option<String>,
}

/// Load every golden case from `path`, in file order.
///
/// Fails on the first record that does not match the schema, so a bad file
/// is rejected before any case is run.
pub fn load_golden_cases(path: &Path) -> Result<Vec<GoldenCase>> {
    if !path.exists() {
        return Err(RagError::GoldenFileNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|e| RagError::io(path, e))?;
    parse_golden_cases(&content)
}

/// Parse golden cases from a JSON string.
pub fn parse_golden_cases(content: &str) -> Result<Vec<GoldenCase>> {
    let records: Vec<Value> = serde_json::from_str(content)
        .map_err(|e| RagError::Serialization(format!("Golden file is not a JSON array: {}", e)))?;

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::from_value(record).map_err(|e| RagError::Schema {
                index,
                message: e.to_string(),
            })
        })
        .collect()
}
