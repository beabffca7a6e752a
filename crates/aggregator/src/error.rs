//! Aggregator Error Types

use thiserror::Error;

/// Errors raised while building an aggregator
#[derive(Debug, Error)]
pub enum AggregateError {
    /// A configuration value is out of its usable range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
