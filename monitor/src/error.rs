//! Error types for LogMonitor.
//!
//! Each module owns a focused error enum; [`MonitorError`] gathers them so the
//! monitor and the binary can propagate any of them with `?`.

use thiserror::Error;

use crate::config::ConfigError;
use crate::tail::TailError;
use crate::watcher::WatcherError;

/// Errors that can occur during monitor operations.
///
/// # Examples
///
/// ```
/// use logmonitor::error::MonitorError;
///
/// fn compile(pattern: &str) -> Result<regex::Regex, MonitorError> {
///     Ok(regex::Regex::new(pattern)?)
/// }
///
/// assert!(matches!(compile("("), Err(MonitorError::Filter(_))));
/// ```
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The filter pattern failed to compile.
    #[error("invalid filter pattern: {0}")]
    Filter(#[from] regex::Error),

    /// Reading the tailed file failed.
    #[error("tail error: {0}")]
    Tail(#[from] TailError),

    /// Establishing or releasing the change notification failed.
    #[error("file watch error: {0}")]
    Watch(#[from] WatcherError),

    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn config_error_to_monitor_error_conversion() {
        let config_err = ConfigError::FileNotFound(PathBuf::from("/tmp/a.log"));
        let err: MonitorError = config_err.into();
        assert!(matches!(err, MonitorError::Config(_)));
        assert_eq!(
            err.to_string(),
            "configuration error: Log file '/tmp/a.log' not found"
        );
    }

    #[test]
    fn filter_error_conversion() {
        let regex_err = regex::Regex::new("[unclosed").unwrap_err();
        let err: MonitorError = regex_err.into();
        assert!(matches!(err, MonitorError::Filter(_)));
        assert!(err.to_string().starts_with("invalid filter pattern:"));
    }

    #[test]
    fn tail_error_conversion() {
        let tail_err = TailError::Read {
            path: PathBuf::from("/tmp/a.log"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk gone"),
        };
        let err: MonitorError = tail_err.into();
        assert_eq!(
            err.to_string(),
            "tail error: failed to read /tmp/a.log: disk gone"
        );
    }

    #[test]
    fn watch_error_display() {
        let err: MonitorError = WatcherError::AlreadySubscribed(PathBuf::from("/tmp")).into();
        assert_eq!(
            err.to_string(),
            "file watch error: notifier is already subscribed to /tmp"
        );
    }

    #[test]
    fn monitor_error_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: MonitorError = io_err.into();
        assert!(matches!(err, MonitorError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn error_source_chain() {
        use std::error::Error;

        let tail_err = TailError::Open {
            path: PathBuf::from("/tmp/a.log"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let monitor_err: MonitorError = tail_err.into();

        let source = monitor_err.source().expect("tail error source");
        assert!(source.source().is_some());
    }

    #[test]
    fn result_type_alias_works() {
        fn example_function() -> Result<i32> {
            Ok(42)
        }

        assert_eq!(example_function().unwrap(), 42);
    }
}
