//! API Error Types

use aggregator::AggregateError;
use log_source::SourceError;
use thiserror::Error;

/// Errors raised while configuring or starting the server
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Aggregator error: {0}")]
    Aggregate(#[from] AggregateError),

    #[error("Log source error: {0}")]
    Source(#[from] SourceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Metrics setup failed: {0}")]
    Metrics(String),

    #[error("Invalid rate limit: {0}")]
    RateLimit(String),
}
