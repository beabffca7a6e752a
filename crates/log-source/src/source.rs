//! Log Source Trait

use async_trait::async_trait;

use crate::error::SourceError;

/// Capability for reading append-only sensor logs.
///
/// Implementations must fail with a [`SourceError`] rather than return
/// partial content when a fetch cannot complete.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Establish the underlying connection or handle
    async fn open(&self) -> Result<(), SourceError>;

    /// Return the trailing `max_lines` non-empty lines of the log at `path`
    async fn tail(&self, path: &str, max_lines: usize) -> Result<String, SourceError>;

    /// Return the full content of the log at `path`
    async fn read_all(&self, path: &str) -> Result<String, SourceError>;

    /// Append one line to the log at `path`
    async fn append_line(&self, path: &str, line: &str) -> Result<(), SourceError>;

    /// Release the underlying connection or handle
    async fn close(&self);

    /// Whether the source is currently open
    fn is_open(&self) -> bool;
}
