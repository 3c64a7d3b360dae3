//! LogMonitor - real-time log file tailing and analysis.
//!
//! This crate tails a single growing log file, classifies each new line by
//! keyword severity, prints it with a timestamp, and optionally keeps running
//! statistics that are summarised on shutdown.
//!
//! # Overview
//!
//! A [`Monitor`] subscribes to change notifications for the log file's
//! directory. Every notification for the file triggers a [`TailCursor`] poll,
//! which returns only the bytes appended since the previous poll. Lines pass
//! through an optional [`LineFilter`], are classified, printed, and recorded
//! into a [`StatsAccumulator`].
//!
//! # Modules
//!
//! - [`classifier`]: Keyword-based severity classification
//! - [`clock`]: Injectable time source
//! - [`config`]: Validated runtime configuration
//! - [`error`]: Error types for monitor operations
//! - [`filter`]: Regex line filter
//! - [`monitor`]: The watch loop
//! - [`output`]: Console line formatting
//! - [`stats`]: Line counters and throughput buckets
//! - [`tail`]: Incremental file reader
//! - [`types`]: Shared value types
//! - [`watcher`]: File system change notifications

pub mod classifier;
pub mod clock;
pub mod config;
pub mod error;
pub mod filter;
pub mod monitor;
pub mod output;
pub mod stats;
pub mod tail;
pub mod types;
pub mod watcher;

pub use classifier::{classify, Severity};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigError, WatchBackend};
pub use error::{MonitorError, Result};
pub use filter::LineFilter;
pub use monitor::Monitor;
pub use stats::{StatsAccumulator, StatsSnapshot};
pub use tail::{TailCursor, TailError};
pub use types::{ClassifiedLine, MonitorState};
pub use watcher::{ChangeEvent, ChangeKind, ChangeNotifier, FsNotifier, WatcherError};
