//! In-Memory Log Source
//!
//! Holds log contents in a map. Used by tests and the demo mode of the
//! server; individual paths can be made to fail to exercise fallbacks.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tracing::{debug, info};

use crate::error::SourceError;
use crate::last_lines;
use crate::source::LogSource;

/// In-memory log source
#[derive(Default)]
pub struct MemorySource {
    logs: RwLock<HashMap<String, String>>,
    failing: RwLock<HashSet<String>>,
    open: AtomicBool,
}

impl MemorySource {
    /// Create an empty, already-open source
    pub fn new() -> Self {
        let source = Self::default();
        source.open.store(true, Ordering::Release);
        source
    }

    /// Builder-style insert of a log
    pub fn with_log(self, path: &str, content: &str) -> Self {
        self.set_log(path, content);
        self
    }

    /// Replace the content of the log at `path`
    pub fn set_log(&self, path: &str, content: &str) {
        if let Ok(mut logs) = self.logs.write() {
            logs.insert(path.to_string(), content.to_string());
        }
    }

    /// Make every fetch of `path` fail
    pub fn fail_path(&self, path: &str) {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(path.to_string());
        }
    }

    fn fetch(&self, path: &str) -> Result<String, SourceError> {
        if !self.open.load(Ordering::Acquire) {
            return Err(SourceError::NotOpen);
        }
        let failing = self
            .failing
            .read()
            .map_err(|e| SourceError::Unavailable(format!("Lock error: {}", e)))?;
        if failing.contains(path) {
            debug!("Injected failure for {}", path);
            return Err(SourceError::Unavailable(path.to_string()));
        }
        let logs = self
            .logs
            .read()
            .map_err(|e| SourceError::Unavailable(format!("Lock error: {}", e)))?;
        logs.get(path)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(path.to_string()))
    }
}

#[async_trait]
impl LogSource for MemorySource {
    async fn open(&self) -> Result<(), SourceError> {
        self.open.store(true, Ordering::Release);
        info!("Opened in-memory log source");
        Ok(())
    }

    async fn tail(&self, path: &str, max_lines: usize) -> Result<String, SourceError> {
        self.fetch(path).map(|content| last_lines(&content, max_lines))
    }

    async fn read_all(&self, path: &str) -> Result<String, SourceError> {
        self.fetch(path)
    }

    async fn append_line(&self, path: &str, line: &str) -> Result<(), SourceError> {
        if !self.open.load(Ordering::Acquire) {
            return Err(SourceError::NotOpen);
        }
        let mut logs = self
            .logs
            .write()
            .map_err(|e| SourceError::Unavailable(format!("Lock error: {}", e)))?;
        let entry = logs.entry(path.to_string()).or_default();
        entry.push_str(&line.replace(['\r', '\n'], " "));
        entry.push('\n');
        Ok(())
    }

    async fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}
