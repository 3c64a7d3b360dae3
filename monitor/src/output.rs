//! Console rendering of classified lines.
//!
//! Each line is printed as `[YYYY-MM-DD HH:MM:SS] <prefix><text>` using local
//! time. Errors are wrapped in red and warnings in yellow when color is
//! enabled.

use chrono::{DateTime, Local, Utc};
use crossterm::style::{style, Stylize};

use crate::classifier::Severity;
use crate::types::ClassifiedLine;

/// Timestamp layout used in the line prefix.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats `timestamp` in local time for the line prefix.
#[must_use]
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Renders a classified line without a trailing newline.
#[must_use]
pub fn format_line(line: &ClassifiedLine, color: bool) -> String {
    let timestamp = format_timestamp(line.timestamp);
    let body = format!("{}{}", line.severity.prefix(), line.text);

    let body = if color {
        match line.severity {
            Severity::Error => style(body).red().to_string(),
            Severity::Warning => style(body).yellow().to_string(),
            Severity::Normal => body,
        }
    } else {
        body
    };

    format!("[{timestamp}] {body}")
}
