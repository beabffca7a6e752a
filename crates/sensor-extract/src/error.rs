//! Extraction Error Types

use thiserror::Error;

/// Errors while turning a log line into a reading
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    /// No data rows in the window
    #[error("No data rows")]
    Empty,

    /// Row has fewer columns than the log format requires
    #[error("Expected at least {expected} columns, found {found}")]
    MissingColumns { expected: usize, found: usize },

    /// Timestamp column did not normalize
    #[error("Unparseable timestamp: {0:?}")]
    InvalidTimestamp(String),

    /// Numeric column is not a finite number
    #[error("Invalid {field} value: {raw:?}")]
    InvalidNumber { field: &'static str, raw: String },

    /// Value parsed but is outside its physical range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Expected pattern absent from a free-text column
    #[error("Pattern not found in {0:?}")]
    PatternNotFound(String),

    /// CSV tokenizer error
    #[error("CSV error: {0}")]
    Csv(String),
}
