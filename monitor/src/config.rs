//! Configuration module for LogMonitor.
//!
//! The binary builds a [`Config`] from command-line arguments. All validation
//! happens here, before any watch is established, so startup failures surface
//! as a single [`ConfigError`].
//!
//! # Settings
//!
//! | Setting | CLI flag | Default | Description |
//! |---------|----------|---------|-------------|
//! | `log_file` | `<LOGFILE>` | - | File to tail, resolved to an absolute path |
//! | `filter` | `-f, --filter` | none | Regex a line must match to be shown |
//! | `verbose` | `-v, --verbose` | off | Report read errors on stderr |
//! | `stats` | `-s, --stats` | off | Print a statistics summary on shutdown |
//! | `backend` | `--poll` | native | Notification backend |
//! | `poll_interval` | `--poll-interval-ms` | 500 ms | Rescan interval for `--poll` |
//! | `color` | `--no-color` | terminal | ANSI colors for errors and warnings |
//!
//! # Example
//!
//! ```no_run
//! use logmonitor::config::Config;
//!
//! let config = Config::new("/var/log/app.log")
//!     .expect("log file exists")
//!     .with_filter(Some("^DB".to_string()))
//!     .with_stats(true);
//! assert!(config.log_file.is_absolute());
//! ```

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::watcher::DEFAULT_POLL_INTERVAL;

/// Default capacity of the notification channel.
const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Errors that can occur while building the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The log file does not exist.
    #[error("Log file '{0}' not found")]
    FileNotFound(PathBuf),

    /// The path exists but is not a regular file.
    #[error("'{0}' is not a regular file")]
    NotAFile(PathBuf),

    /// The path could not be resolved.
    #[error("failed to resolve {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A setting has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Which notify backend delivers change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchBackend {
    /// Platform event API (inotify, FSEvents, ReadDirectoryChangesW).
    #[default]
    Native,
    /// Periodic rescans.
    Polling,
}

/// Configuration for a monitoring session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute path of the file to tail.
    pub log_file: PathBuf,

    /// Optional regex source; compiled when the monitor starts.
    pub filter: Option<String>,

    /// Report internal read errors on stderr.
    pub verbose: bool,

    /// Track statistics and print the summary on shutdown.
    pub stats: bool,

    /// Wrap errors and warnings in ANSI colors.
    pub color: bool,

    /// Notification backend.
    pub backend: WatchBackend,

    /// Rescan interval for [`WatchBackend::Polling`].
    pub poll_interval: Duration,

    /// Capacity of the channel between the notify thread and the monitor.
    pub channel_capacity: usize,
}

impl Config {
    /// Creates a configuration for `log_file` with every option at its
    /// default.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - the file does not exist
    /// - the path is not a regular file
    /// - the path cannot be canonicalized
    pub fn new(log_file: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let log_file = resolve_log_file(log_file.into())?;

        Ok(Self {
            log_file,
            filter: None,
            verbose: false,
            stats: false,
            color: false,
            backend: WatchBackend::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        })
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_stats(mut self, stats: bool) -> Self {
        self.stats = stats;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn with_backend(mut self, backend: WatchBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the polling interval.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `interval` is zero.
    pub fn with_poll_interval(mut self, interval: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "poll-interval-ms".to_string(),
                message: "poll interval must be greater than 0".to_string(),
            });
        }
        self.poll_interval = interval;
        Ok(self)
    }

    /// Sets the notification channel capacity.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `capacity` is zero.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "channel_capacity".to_string(),
                message: "channel capacity must be greater than 0".to_string(),
            });
        }
        self.channel_capacity = capacity;
        Ok(self)
    }
}

/// Checks that `path` names an existing regular file and makes it absolute.
fn resolve_log_file(path: PathBuf) -> Result<PathBuf, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path));
    }
    if !path.is_file() {
        return Err(ConfigError::NotAFile(path));
    }
    path.canonicalize()
        .map_err(|source| ConfigError::Resolve { path, source })
}
