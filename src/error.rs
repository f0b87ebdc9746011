//! Error types for the chart query path.

use std::time::Duration;

use thiserror::Error;

/// A request parameter failed validation.
///
/// Carries the offending field so the HTTP layer can report a precise 400.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Failure while talking to the analytical store.
#[derive(Error, Debug)]
pub enum DataSourceError {
    /// The driver rejected or aborted the statement.
    #[error("query failed: {0}")]
    Query(#[from] duckdb::Error),

    /// The statement did not complete within the configured timeout.
    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    /// The blocking worker running the statement went away.
    #[error("query worker failed: {0}")]
    Worker(String),
}
