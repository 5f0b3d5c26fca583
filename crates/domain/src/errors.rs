//! Error types used throughout the client

use serde_json::Value;
use thiserror::Error;

/// Main error type for weavelink
#[derive(Error, Debug)]
pub enum WeaveError {
    /// The server or the authentication service could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A single HTTP call exceeded its read timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Unexpected status code: {status}, with response body: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("{context}! Unexpected status code: {status}, with response body: {body}")]
    UnsuccessfulStatus { context: String, status: u16, body: String },

    /// Timeout retries of a batch send were exhausted.
    #[error("{0}")]
    BatchTimeout(String),

    /// The batch request succeeded but at least one object reported errors.
    #[error(
        "Error while creating objects in batch: {} of {} objects reported errors",
        count_item_errors(.results),
        .results.len()
    )]
    BatchObjectCreation { results: Vec<Value>, items: Vec<Value> },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Index {index} out of range for batch of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WeaveError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } | Self::UnsuccessfulStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<serde_json::Error> for WeaveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Returns `true` when a per-object batch result carries `result.errors`.
pub fn has_item_error(result: &Value) -> bool {
    result.get("result").and_then(|inner| inner.get("errors")).is_some_and(|errors| !errors.is_null())
}

fn count_item_errors(results: &[Value]) -> usize {
    results.iter().filter(|result| has_item_error(result)).count()
}

/// Result type alias for weavelink operations
pub type Result<T> = std::result::Result<T, WeaveError>;
