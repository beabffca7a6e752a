//! Log Source Error Types

use thiserror::Error;

/// Errors raised while fetching log content
#[derive(Debug, Error)]
pub enum SourceError {
    /// The log file does not exist
    #[error("Log not found: {0}")]
    NotFound(String),

    /// Underlying I/O failure
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// Fetch did not complete in time
    #[error("Timeout fetching {path} after {timeout_ms}ms")]
    Timeout { path: String, timeout_ms: u64 },

    /// Fetch attempted before `open` or after `close`
    #[error("Log source is not open")]
    NotOpen,

    /// Content is not valid UTF-8
    #[error("Log {0} is not valid UTF-8")]
    InvalidEncoding(String),

    /// Injected failure (test and demo sources)
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    /// Map an I/O error on `path`, keeping not-found distinct
    pub fn from_io(path: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound(path.to_string()),
            _ => SourceError::Io {
                path: path.to_string(),
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinct() {
        let err = SourceError::from_io(
            "obd/trackLog.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(matches!(err, SourceError::NotFound(ref p) if p == "obd/trackLog.csv"));

        let err = SourceError::from_io(
            "obd/trackLog.csv",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
