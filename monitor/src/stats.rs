//! Running statistics for processed log lines.
//!
//! [`StatsAccumulator`] counts lines by severity and keeps a series of
//! completed one-minute throughput buckets. A [`StatsSnapshot`] derives rates
//! and averages from those counters on demand, and
//! [`StatsAccumulator::format_summary`] renders the block printed at shutdown:
//!
//! ```text
//! ==================================================
//! LOG MONITORING SUMMARY
//! ==================================================
//! Runtime: 0:05:12
//! Total lines processed: 120
//! Error lines: 6 (5.0%)
//! Warning lines: 12 (10.0%)
//! Average lines per minute: 24.0
//! ==================================================
//! ```

use std::fmt::Write as _;

use chrono::{DateTime, Duration, Utc};
use tracing::trace;

use crate::classifier::Severity;
use crate::clock::Clock;

/// Length of a throughput bucket.
const MINUTE_SECS: i64 = 60;

/// Width of the summary banner.
const BANNER_WIDTH: usize = 50;

/// Summary title line.
const SUMMARY_TITLE: &str = "LOG MONITORING SUMMARY";

/// Derived metrics computed from a [`StatsAccumulator`].
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    /// Time since the accumulator was created.
    pub runtime: Duration,
    pub total_lines: u64,
    pub error_count: u64,
    pub warning_count: u64,
    /// Percentage of lines classified as errors, 0 when no lines were seen.
    pub error_rate: f64,
    /// Percentage of lines classified as warnings, 0 when no lines were seen.
    pub warning_rate: f64,
    /// Mean of completed minute buckets. The in-progress minute is excluded.
    pub avg_lines_per_minute: f64,
}

/// Mutable line counters and per-minute throughput series.
#[derive(Debug)]
pub struct StatsAccumulator<C: Clock> {
    clock: C,
    start_time: DateTime<Utc>,
    total_lines: u64,
    error_count: u64,
    warning_count: u64,
    /// Completed minute buckets, oldest first.
    lines_per_minute: Vec<u64>,
    /// Lines seen since the last minute boundary.
    minute_counter: u64,
    last_minute_check: DateTime<Utc>,
}

impl<C: Clock> StatsAccumulator<C> {
    /// Creates an accumulator whose runtime and first minute start now.
    pub fn new(clock: C) -> Self {
        let now = clock.now();
        Self {
            clock,
            start_time: now,
            total_lines: 0,
            error_count: 0,
            warning_count: 0,
            lines_per_minute: Vec::new(),
            minute_counter: 0,
            last_minute_check: now,
        }
    }

    /// Records one processed line.
    ///
    /// When a full minute has passed since the last boundary, the pending
    /// count is closed into the series before this line is counted, so the
    /// line lands in the new minute.
    pub fn record(&mut self, severity: Severity) {
        self.total_lines += 1;

        match severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
            Severity::Normal => {}
        }

        let now = self.clock.now();
        if now - self.last_minute_check >= Duration::seconds(MINUTE_SECS) {
            trace!(
                lines = self.minute_counter,
                buckets = self.lines_per_minute.len() + 1,
                "Closing minute bucket"
            );
            self.lines_per_minute.push(self.minute_counter);
            self.minute_counter = 1;
            self.last_minute_check = now;
        } else {
            self.minute_counter += 1;
        }
    }

    /// Computes the current derived metrics.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let runtime = self.clock.now() - self.start_time;

        let avg_lines_per_minute = if self.lines_per_minute.is_empty() {
            0.0
        } else {
            let sum: u64 = self.lines_per_minute.iter().sum();
            sum as f64 / self.lines_per_minute.len() as f64
        };

        StatsSnapshot {
            runtime,
            total_lines: self.total_lines,
            error_count: self.error_count,
            warning_count: self.warning_count,
            error_rate: percentage(self.error_count, self.total_lines),
            warning_rate: percentage(self.warning_count, self.total_lines),
            avg_lines_per_minute,
        }
    }

    /// Renders the shutdown summary block, ending with a newline.
    #[must_use]
    pub fn format_summary(&self) -> String {
        self.snapshot().to_summary()
    }

    /// Completed minute buckets, oldest first.
    #[must_use]
    pub fn minute_buckets(&self) -> &[u64] {
        &self.lines_per_minute
    }

    /// Lines counted toward the minute still in progress.
    #[must_use]
    pub fn pending_minute_count(&self) -> u64 {
        self.minute_counter
    }
}

impl StatsSnapshot {
    /// Renders this snapshot as the human-readable summary block.
    #[must_use]
    pub fn to_summary(&self) -> String {
        let banner = "=".repeat(BANNER_WIDTH);
        let mut out = String::new();

        // Writing into a String cannot fail.
        let _ = writeln!(out);
        let _ = writeln!(out, "{banner}");
        let _ = writeln!(out, "{SUMMARY_TITLE}");
        let _ = writeln!(out, "{banner}");
        let _ = writeln!(out, "Runtime: {}", format_runtime(self.runtime));
        let _ = writeln!(out, "Total lines processed: {}", self.total_lines);
        let _ = writeln!(
            out,
            "Error lines: {} ({:.1}%)",
            self.error_count, self.error_rate
        );
        let _ = writeln!(
            out,
            "Warning lines: {} ({:.1}%)",
            self.warning_count, self.warning_rate
        );
        if self.avg_lines_per_minute > 0.0 {
            let _ = writeln!(
                out,
                "Average lines per minute: {:.1}",
                self.avg_lines_per_minute
            );
        }
        let _ = writeln!(out, "{banner}");

        out
    }
}

fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Formats a duration as `H:MM:SS`, truncating sub-second precision.
///
/// Negative durations (a clock stepping backwards) render as `0:00:00`.
#[must_use]
pub fn format_runtime(runtime: Duration) -> String {
    let total = runtime.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}
