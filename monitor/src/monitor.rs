//! The watch loop tying the pipeline together.
//!
//! A [`Monitor`] owns the tail cursor, the optional filter, the optional
//! statistics accumulator, and the output sink. Change notifications arrive
//! over a channel and are handled one at a time by [`Monitor::run`], so the
//! cursor offset and the counters are only ever touched from one task.
//!
//! ```text
//! notify thread ──ChangeEvent──▶ mpsc ──▶ Monitor::run
//!                                            │ TailCursor::poll
//!                                            │ LineFilter::matches
//!                                            │ classify
//!                                            ├─▶ output (flushed per line)
//!                                            └─▶ StatsAccumulator::record
//! ```

use std::future::Future;
use std::io::Write;
use std::path::Path;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::clock::Clock;
use crate::config::Config;
use crate::error::Result;
use crate::filter::LineFilter;
use crate::output::format_line;
use crate::stats::{StatsAccumulator, StatsSnapshot};
use crate::tail::TailCursor;
use crate::types::{ClassifiedLine, MonitorState};
use crate::watcher::{ChangeEvent, ChangeKind, ChangeNotifier};

/// Tails one file and reports its new lines.
#[derive(Debug)]
pub struct Monitor<C: Clock + Clone, W: Write> {
    cursor: TailCursor,
    filter: Option<LineFilter>,
    stats: Option<StatsAccumulator<C>>,
    clock: C,
    out: W,
    verbose: bool,
    color: bool,
    channel_capacity: usize,
    state: MonitorState,
}

impl<C: Clock + Clone, W: Write> Monitor<C, W> {
    /// Prepares a monitor for `config.log_file`.
    ///
    /// The cursor is placed at the current end of the file, so content
    /// written before this call is never printed.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter pattern does not compile or the file
    /// cannot be opened.
    pub fn new(config: &Config, clock: C, out: W) -> Result<Self> {
        let filter = config
            .filter
            .as_deref()
            .map(LineFilter::new)
            .transpose()?;
        let cursor = TailCursor::open(&config.log_file)?;
        let stats = config
            .stats
            .then(|| StatsAccumulator::new(clock.clone()));

        info!(
            path = %cursor.path().display(),
            offset = cursor.offset(),
            filter = filter.as_ref().map(LineFilter::pattern),
            stats = config.stats,
            "Monitor initialized"
        );

        Ok(Self {
            cursor,
            filter,
            stats,
            clock,
            out,
            verbose: config.verbose,
            color: config.color,
            channel_capacity: config.channel_capacity,
            state: MonitorState::Starting,
        })
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// The cursor over the tailed file.
    #[must_use]
    pub fn cursor(&self) -> &TailCursor {
        &self.cursor
    }

    /// Statistics, when enabled.
    #[must_use]
    pub fn stats(&self) -> Option<&StatsAccumulator<C>> {
        self.stats.as_ref()
    }

    /// The output sink.
    #[must_use]
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Runs the filter, classifier, output, and statistics for one line.
    ///
    /// Returns `None` when the filter rejects the line; rejected lines are
    /// neither printed nor counted.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output sink fails.
    pub fn process_line(&mut self, text: &str) -> Result<Option<ClassifiedLine>> {
        if let Some(filter) = &self.filter {
            if !filter.matches(text) {
                trace!(line = text, "Line rejected by filter");
                return Ok(None);
            }
        }

        let line = ClassifiedLine::new(text, self.clock.now());
        trace!(severity = %line.severity, "Line classified");

        writeln!(self.out, "{}", format_line(&line, self.color))?;
        self.out.flush()?;

        if let Some(stats) = &mut self.stats {
            stats.record(line.severity);
        }

        Ok(Some(line))
    }

    /// Polls the file for new lines and processes each of them.
    ///
    /// Read failures are not fatal: they are reported on stderr when verbose
    /// and otherwise dropped, and the unread region is retried on the next
    /// change. Returns the number of lines that passed the filter.
    ///
    /// # Errors
    ///
    /// Returns an error only if writing to the output sink fails. The cursor
    /// has already advanced past the whole batch by then, so lines after the
    /// failed write are consumed without being printed or counted.
    pub fn handle_change(&mut self) -> Result<usize> {
        let lines = match self.cursor.poll() {
            Ok(lines) => lines,
            Err(e) => {
                debug!(error = %e, "Failed to read new lines");
                if self.verbose {
                    eprintln!("Error reading file: {e}");
                }
                return Ok(0);
            }
        };

        let mut shown = 0;
        for line in &lines {
            if self.process_line(line)?.is_some() {
                shown += 1;
            }
        }

        debug!(read = lines.len(), shown, "Processed change");
        Ok(shown)
    }

    /// Subscribes through `notifier` and processes changes until `shutdown`
    /// completes, then prints the summary when statistics are enabled.
    ///
    /// Returns the final statistics snapshot, if statistics are enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be established or
    /// released, or if writing output fails.
    pub async fn run<F>(
        &mut self,
        notifier: &mut dyn ChangeNotifier,
        shutdown: F,
    ) -> Result<Option<StatsSnapshot>>
    where
        F: Future<Output = ()>,
    {
        let (tx, mut rx) = mpsc::channel::<ChangeEvent>(self.channel_capacity);
        let directory = self.cursor.directory().to_path_buf();

        notifier.subscribe(&directory, tx)?;
        self.state = MonitorState::Running;
        info!(directory = %directory.display(), state = %self.state, "Monitor running");

        tokio::pin!(shutdown);

        let outcome = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break Ok(());
                }

                event = rx.recv() => {
                    let Some(event) = event else {
                        warn!("Change notification channel closed");
                        break Ok(());
                    };
                    if let Err(e) = self.dispatch(&event) {
                        break Err(e);
                    }
                }
            }
        };

        self.state = MonitorState::Stopping;
        debug!(state = %self.state, "Releasing subscription");
        let unsubscribed = notifier.unsubscribe();
        outcome?;
        unsubscribed?;

        let snapshot = self.finish()?;
        self.state = MonitorState::Stopped;
        info!(state = %self.state, "Monitor stopped");

        Ok(snapshot)
    }

    /// Routes one change event.
    fn dispatch(&mut self, event: &ChangeEvent) -> Result<()> {
        if !self.is_target(&event.path) {
            trace!(path = %event.path.display(), "Ignoring change to other file");
            return Ok(());
        }

        match event.kind {
            ChangeKind::Created | ChangeKind::Modified => {
                self.handle_change()?;
            }
            ChangeKind::Removed => {
                info!(path = %event.path.display(), "Log file removed, waiting for it to return");
            }
        }
        Ok(())
    }

    /// Event paths may differ in form from the canonical target path (for
    /// example through symlinked directories), but the watch is scoped to the
    /// target's directory, so matching on file name is sufficient.
    fn is_target(&self, path: &Path) -> bool {
        let target = self.cursor.path();
        path == target || (path.file_name().is_some() && path.file_name() == target.file_name())
    }

    /// Writes the summary block and returns the final snapshot.
    fn finish(&mut self) -> Result<Option<StatsSnapshot>> {
        let Some(stats) = &self.stats else {
            return Ok(None);
        };

        let snapshot = stats.snapshot();
        write!(self.out, "{}", snapshot.to_summary())?;
        self.out.flush()?;

        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Severity;
    use crate::clock::ManualClock;
    use crate::error::MonitorError;
    use std::fs::{self, OpenOptions};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn setup(initial: &str) -> (TempDir, PathBuf) {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("app.log");
        fs::write(&path, initial).expect("Failed to write file");
        (temp_dir, path)
    }

    fn append(path: &Path, content: &str) {
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    fn monitor(config: &Config) -> Monitor<ManualClock, Vec<u8>> {
        Monitor::new(config, ManualClock::default(), Vec::new()).expect("monitor")
    }

    fn output(monitor: &Monitor<ManualClock, Vec<u8>>) -> String {
        String::from_utf8(monitor.output().clone()).unwrap()
    }

    #[test]
    fn test_new_starts_at_end_of_file() {
        let (_dir, path) = setup("old error line\n");
        let config = Config::new(&path).unwrap();
        let mut monitor = monitor(&config);

        assert_eq!(monitor.state(), MonitorState::Starting);
        assert_eq!(monitor.cursor().offset(), 15);
        assert_eq!(monitor.handle_change().unwrap(), 0);
        assert!(output(&monitor).is_empty());
    }

    #[test]
    fn test_invalid_filter_is_fatal() {
        let (_dir, path) = setup("");
        let config = Config::new(&path)
            .unwrap()
            .with_filter(Some("[unclosed".to_string()));

        let result = Monitor::new(&config, ManualClock::default(), Vec::new());
        assert!(matches!(result, Err(MonitorError::Filter(_))));
    }

    #[test]
    fn test_error_line_printed_and_counted() {
        let (_dir, path) = setup("");
        let config = Config::new(&path).unwrap().with_stats(true);
        let mut monitor = monitor(&config);

        append(&path, "System failure occurred\n");
        assert_eq!(monitor.handle_change().unwrap(), 1);

        let out = output(&monitor);
        assert!(out.contains("] ERROR: System failure occurred\n"));
        assert!(out.starts_with('['));

        let snap = monitor.stats().unwrap().snapshot();
        assert_eq!(snap.total_lines, 1);
        assert_eq!(snap.error_count, 1);
    }

    #[test]
    fn test_filter_discards_before_classification() {
        let (_dir, path) = setup("");
        let config = Config::new(&path)
            .unwrap()
            .with_filter(Some("^DB".to_string()))
            .with_stats(true);
        let mut monitor = monitor(&config);

        append(&path, "DB connection lost\nUser login ok\n");
        assert_eq!(monitor.handle_change().unwrap(), 1);

        let out = output(&monitor);
        assert!(out.contains("DB connection lost"));
        assert!(!out.contains("User login ok"));
        assert_eq!(monitor.stats().unwrap().snapshot().total_lines, 1);
    }

    #[test]
    fn test_process_line_returns_classification() {
        let (_dir, path) = setup("");
        let config = Config::new(&path).unwrap();
        let mut monitor = monitor(&config);

        let line = monitor.process_line("deprecated option").unwrap().unwrap();
        assert_eq!(line.severity, Severity::Warning);
        assert!(output(&monitor).contains("WARN: deprecated option"));
    }

    #[test]
    fn test_stats_disabled_means_no_accumulator() {
        let (_dir, path) = setup("");
        let config = Config::new(&path).unwrap();
        let monitor = monitor(&config);
        assert!(monitor.stats().is_none());
    }

    #[test]
    fn test_read_error_does_not_advance() {
        let (_dir, path) = setup("abc\n");
        let config = Config::new(&path).unwrap().with_verbose(true);
        let mut monitor = monitor(&config);
        let offset = monitor.cursor().offset();

        fs::remove_file(&path).unwrap();
        assert_eq!(monitor.handle_change().unwrap(), 0);
        assert_eq!(monitor.cursor().offset(), offset);
    }

    /// Sink that accepts one line and fails every write after it.
    #[derive(Debug, Default)]
    struct OneLineSink {
        written: Vec<u8>,
    }

    impl Write for OneLineSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.written.contains(&b'\n') {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "stdout closed",
                ));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_consumes_rest_of_batch() {
        let (_dir, path) = setup("");
        let config = Config::new(&path).unwrap().with_stats(true);
        let mut monitor =
            Monitor::new(&config, ManualClock::default(), OneLineSink::default()).unwrap();

        append(&path, "first\nsecond\nthird\n");
        let result = monitor.handle_change();
        assert!(matches!(result, Err(MonitorError::Io(_))));

        let printed = String::from_utf8(monitor.output().written.clone()).unwrap();
        assert!(printed.contains("first"));
        assert!(!printed.contains("second"));
        assert_eq!(monitor.cursor().offset(), fs::metadata(&path).unwrap().len());
        assert_eq!(monitor.stats().unwrap().snapshot().total_lines, 1);
        assert_eq!(monitor.handle_change().unwrap(), 0);
    }

    #[test]
    fn test_is_target_matches_file_name() {
        let (dir, path) = setup("");
        let config = Config::new(&path).unwrap();
        let monitor = monitor(&config);

        assert!(monitor.is_target(&config.log_file));
        assert!(monitor.is_target(&dir.path().join("app.log")));
        assert!(!monitor.is_target(&dir.path().join("other.log")));
        assert!(!monitor.is_target(Path::new("/")));
    }

    #[test]
    fn test_dispatch_ignores_other_files_and_removals() {
        let (dir, path) = setup("");
        let config = Config::new(&path).unwrap();
        let mut monitor = monitor(&config);

        append(&path, "hello\n");

        monitor
            .dispatch(&ChangeEvent {
                path: dir.path().join("other.log"),
                kind: ChangeKind::Modified,
            })
            .unwrap();
        monitor
            .dispatch(&ChangeEvent {
                path: config.log_file.clone(),
                kind: ChangeKind::Removed,
            })
            .unwrap();
        assert!(output(&monitor).is_empty());

        monitor
            .dispatch(&ChangeEvent {
                path: config.log_file.clone(),
                kind: ChangeKind::Created,
            })
            .unwrap();
        assert!(output(&monitor).contains("hello"));
    }
}
