//! Incremental reader for a single growing file.
//!
//! [`TailCursor`] remembers the byte offset it has consumed up to. Every
//! [`poll`](TailCursor::poll) reopens the file, seeks to that offset, and
//! returns whatever has been appended since. The offset only moves after a
//! read succeeds, so a failed poll leaves the unread region in place for the
//! next attempt.
//!
//! If the file is found to be shorter than the stored offset it has been
//! truncated or replaced (log rotation), and reading restarts from offset 0.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, trace};

/// Errors raised while reading the tailed file.
#[derive(Error, Debug)]
pub enum TailError {
    /// The file could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File metadata could not be read.
    #[error("failed to stat {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Seeking or reading new content failed.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for tail operations.
pub type Result<T> = std::result::Result<T, TailError>;

/// Read position within a tailed file.
#[derive(Debug, Clone)]
pub struct TailCursor {
    path: PathBuf,
    offset: u64,
}

impl TailCursor {
    /// Opens `path` and positions the cursor at its current end, so existing
    /// content is not replayed.
    ///
    /// # Errors
    ///
    /// Returns [`TailError::Open`] if the file cannot be opened, or
    /// [`TailError::Metadata`] if its size cannot be determined.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::open(&path).map_err(|source| TailError::Open {
            path: path.clone(),
            source,
        })?;
        let offset = file
            .metadata()
            .map_err(|source| TailError::Metadata {
                path: path.clone(),
                source,
            })?
            .len();

        debug!(path = %path.display(), offset, "Opened tail cursor at end of file");

        Ok(Self { path, offset })
    }

    /// The file being tailed.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes consumed so far.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Directory containing the tailed file, used to scope change
    /// notifications.
    #[must_use]
    pub fn directory(&self) -> &Path {
        self.path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// Reads lines appended since the last successful poll.
    ///
    /// A trailing fragment without a newline is returned as a line and
    /// consumed. Blank lines are dropped and `\r\n` endings are stripped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, inspected, or read. The
    /// offset is left unchanged in that case.
    pub fn poll(&mut self) -> Result<Vec<String>> {
        let mut file = File::open(&self.path).map_err(|source| TailError::Open {
            path: self.path.clone(),
            source,
        })?;
        let file_size = file
            .metadata()
            .map_err(|source| TailError::Metadata {
                path: self.path.clone(),
                source,
            })?
            .len();

        let start = if file_size < self.offset {
            info!(
                path = %self.path.display(),
                old_pos = self.offset,
                new_size = file_size,
                "File truncated, resetting position to 0"
            );
            0
        } else {
            self.offset
        };

        if start >= file_size {
            trace!(path = %self.path.display(), offset = start, "No new content");
            self.offset = file_size;
            return Ok(Vec::new());
        }

        let mut buf = Vec::new();
        file.seek(SeekFrom::Start(start))
            .and_then(|_| (&mut file).take(file_size - start).read_to_end(&mut buf))
            .map_err(|source| TailError::Read {
                path: self.path.clone(),
                source,
            })?;

        let lines = split_lines(&buf);
        self.offset = start + buf.len() as u64;

        debug!(
            path = %self.path.display(),
            bytes = buf.len(),
            line_count = lines.len(),
            offset = self.offset,
            "Read new content"
        );

        Ok(lines)
    }
}

/// Splits raw bytes into non-blank lines, tolerating invalid UTF-8.
fn split_lines(buf: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(buf)
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}
