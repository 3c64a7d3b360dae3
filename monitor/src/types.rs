//! Shared value types for the monitor pipeline.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::classifier::{classify, Severity};

/// A line read from the tailed file together with its classification.
///
/// Values are produced per line and consumed immediately by output and
/// statistics; nothing retains them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    /// Line text without the trailing newline.
    pub text: String,

    /// Keyword-derived severity.
    pub severity: Severity,

    /// When the line was captured.
    pub timestamp: DateTime<Utc>,
}

impl ClassifiedLine {
    /// Classifies `text` and stamps it with `timestamp`.
    #[must_use]
    pub fn new(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        let text = text.into();
        let severity = classify(&text);
        Self {
            text,
            severity,
            timestamp,
        }
    }
}

/// Lifecycle of a [`Monitor`](crate::monitor::Monitor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Configuration validated, cursor placed, not yet subscribed.
    Starting,
    /// Subscribed and processing change notifications.
    Running,
    /// Cancellation received; unsubscribing and printing the summary.
    Stopping,
    /// Terminal state.
    Stopped,
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classified_line_uses_classifier() {
        let ts = DateTime::<Utc>::UNIX_EPOCH;

        let line = ClassifiedLine::new("System failure occurred", ts);
        assert_eq!(line.severity, Severity::Error);
        assert_eq!(line.text, "System failure occurred");
        assert_eq!(line.timestamp, ts);

        assert_eq!(
            ClassifiedLine::new("deprecated flag", ts).severity,
            Severity::Warning
        );
        assert_eq!(ClassifiedLine::new("hello", ts).severity, Severity::Normal);
    }

    #[test]
    fn monitor_state_display() {
        assert_eq!(MonitorState::Starting.to_string(), "starting");
        assert_eq!(MonitorState::Running.to_string(), "running");
        assert_eq!(MonitorState::Stopping.to_string(), "stopping");
        assert_eq!(MonitorState::Stopped.to_string(), "stopped");
    }
}
