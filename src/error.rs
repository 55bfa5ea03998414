//! Error types for the RAG pipeline and evaluation harness.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, RagError>;

/// Errors that can occur while answering or evaluating.
#[derive(Error, Debug)]
pub enum RagError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The golden test case file does not exist.
    #[error("Golden test cases file not found: {0}")]
    GoldenFileNotFound(PathBuf),

    /// A golden record is missing a required field or has the wrong shape.
    #[error("Invalid golden record at index {index}: {message}")]
    Schema { index: usize, message: String },

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request error (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// A Bedrock service answered with a non-success status.
    #[error("{service} API error ({status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// Response body could not be parsed.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The retrieval step of the pipeline failed.
    #[error("Retrieval failed: {0}")]
    RetrievalFailed(String),

    /// The generation step of the pipeline failed.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Writing a report failed.
    #[error("Report error: {0}")]
    Report(String),
}

impl RagError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for RagError {
    fn from(err: reqwest::Error) -> Self {
        RagError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for RagError {
    fn from(err: serde_json::Error) -> Self {
        RagError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_message() {
        let err = RagError::Schema {
            index: 2,
            message: "missing field `expected_output`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid golden record at index 2: missing field `expected_output`"
        );
    }

    #[test]
    fn test_api_error_message() {
        let err = RagError::Api {
            service: "bedrock-runtime",
            status: 403,
            message: "denied".to_string(),
        };
        assert_eq!(err.to_string(), "bedrock-runtime API error (403): denied");
    }
}
