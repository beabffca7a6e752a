//! Local Filesystem Log Source
//!
//! Reads sensor logs from a directory tree (a synced or mounted copy of the
//! vehicle's log directory). Tails are read backwards from the end of the
//! file in fixed-size chunks so large logs are never loaded whole.

use async_trait::async_trait;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, info};

use crate::error::SourceError;
use crate::last_lines;
use crate::source::LogSource;

/// Bytes read per backwards step while tailing
const CHUNK_SIZE: u64 = 8 * 1024;

/// Log source backed by the local filesystem
pub struct LocalFileSource {
    /// Directory all log paths are resolved against
    root: PathBuf,
    /// Whether `open` has succeeded
    open: AtomicBool,
}

impl LocalFileSource {
    /// Create a new source rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            open: AtomicBool::new(false),
        }
    }

    /// Root directory of this source
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    fn ensure_open(&self) -> Result<(), SourceError> {
        if self.open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(SourceError::NotOpen)
        }
    }
}

#[async_trait]
impl LogSource for LocalFileSource {
    async fn open(&self) -> Result<(), SourceError> {
        let meta = tokio::fs::metadata(&self.root)
            .await
            .map_err(|e| SourceError::from_io(&self.root.to_string_lossy(), e))?;
        if !meta.is_dir() {
            return Err(SourceError::NotFound(self.root.to_string_lossy().into_owned()));
        }
        self.open.store(true, Ordering::Release);
        info!("Opened local log source at {}", self.root.display());
        Ok(())
    }

    async fn tail(&self, path: &str, max_lines: usize) -> Result<String, SourceError> {
        self.ensure_open()?;
        let full = self.resolve(path);
        let mut file = File::open(&full)
            .await
            .map_err(|e| SourceError::from_io(path, e))?;
        let len = file
            .metadata()
            .await
            .map_err(|e| SourceError::from_io(path, e))?
            .len();

        if max_lines == 0 || len == 0 {
            return Ok(String::new());
        }

        let mut pos = len;
        let mut buf: Vec<u8> = Vec::new();
        loop {
            let step = CHUNK_SIZE.min(pos);
            pos -= step;
            file.seek(SeekFrom::Start(pos))
                .await
                .map_err(|e| SourceError::from_io(path, e))?;
            let mut chunk = vec![0u8; step as usize];
            file.read_exact(&mut chunk)
                .await
                .map_err(|e| SourceError::from_io(path, e))?;
            chunk.extend_from_slice(&buf);
            buf = chunk;

            if pos == 0 || complete_lines(&buf) >= max_lines {
                break;
            }
        }

        debug!("Tailed {} bytes from {}", buf.len(), full.display());

        let text = if pos == 0 {
            String::from_utf8(buf).map_err(|_| SourceError::InvalidEncoding(path.to_string()))?
        } else {
            // The first line may start mid-character; it is partial and dropped below.
            let text = String::from_utf8_lossy(&buf).into_owned();
            match text.split_once('\n') {
                Some((_, rest)) => rest.to_string(),
                None => String::new(),
            }
        };

        Ok(last_lines(&text, max_lines))
    }

    async fn read_all(&self, path: &str) -> Result<String, SourceError> {
        self.ensure_open()?;
        let full = self.resolve(path);
        let bytes = tokio::fs::read(&full)
            .await
            .map_err(|e| SourceError::from_io(path, e))?;
        String::from_utf8(bytes).map_err(|_| SourceError::InvalidEncoding(path.to_string()))
    }

    async fn append_line(&self, path: &str, line: &str) -> Result<(), SourceError> {
        self.ensure_open()?;
        let full = self.resolve(path);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&full)
            .await
            .map_err(|e| SourceError::from_io(path, e))?;

        let mut record = line.replace(['\r', '\n'], " ");
        record.push('\n');
        file.write_all(record.as_bytes())
            .await
            .map_err(|e| SourceError::from_io(path, e))?;
        file.flush().await.map_err(|e| SourceError::from_io(path, e))?;
        Ok(())
    }

    async fn close(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            info!("Closed local log source at {}", self.root.display());
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

/// Non-blank lines in `buf` after its first (possibly partial) line
fn complete_lines(buf: &[u8]) -> usize {
    let start = match buf.iter().position(|&b| b == b'\n') {
        Some(i) => i + 1,
        None => return 0,
    };
    buf[start..]
        .split(|&b| b == b'\n')
        .filter(|line| line.iter().any(|b| !b.is_ascii_whitespace()))
        .count()
}
