//! LogMonitor - real-time log file tailing and analysis.
//!
//! This binary tails a log file, prints new lines with a timestamp and
//! severity tag, and optionally prints a statistics summary on Ctrl+C.
//!
//! # Usage
//!
//! ```text
//! logmonitor <LOGFILE> [-v|--verbose] [-f|--filter PATTERN] [-s|--stats]
//!                      [--poll] [--poll-interval-ms MS] [--no-color]
//! ```

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use logmonitor::config::{Config, ConfigError, WatchBackend};
use logmonitor::watcher::{ChangeNotifier, FsNotifier};
use logmonitor::{Monitor, SystemClock};

/// LogMonitor - monitor and analyze log files in real-time.
#[derive(Parser, Debug)]
#[command(name = "logmonitor")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
EXAMPLES:
    # Follow a log file
    logmonitor /var/log/app.log

    # Only show database lines and print statistics on Ctrl+C
    logmonitor /var/log/app.log --filter '^DB' --stats

    # Use the polling backend on a network filesystem
    logmonitor /mnt/share/app.log --poll --poll-interval-ms 1000
")]
struct Cli {
    /// Path to the log file to monitor.
    logfile: PathBuf,

    /// Enable verbose output (report read errors on stderr).
    #[arg(short, long)]
    verbose: bool,

    /// Filter pattern (regex); only matching lines are shown.
    #[arg(short, long, value_name = "PATTERN")]
    filter: Option<String>,

    /// Print a statistics summary on shutdown.
    #[arg(short, long)]
    stats: bool,

    /// Use the polling watcher instead of native file system events.
    #[arg(long)]
    poll: bool,

    /// Polling interval in milliseconds (with --poll).
    #[arg(long, value_name = "MS", default_value_t = 500)]
    poll_interval_ms: u64,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    runtime.block_on(run_monitor(config))
}

/// Validates CLI arguments into a [`Config`].
fn build_config(cli: &Cli) -> std::result::Result<Config, ConfigError> {
    let backend = if cli.poll {
        WatchBackend::Polling
    } else {
        WatchBackend::Native
    };
    let color = !cli.no_color && io::stdout().is_terminal();

    let config = Config::new(&cli.logfile)?
        .with_filter(cli.filter.clone())
        .with_verbose(cli.verbose)
        .with_stats(cli.stats)
        .with_color(color)
        .with_backend(backend)
        .with_poll_interval(Duration::from_millis(cli.poll_interval_ms))?;

    Ok(config)
}

/// Runs the monitor until Ctrl+C or SIGTERM.
async fn run_monitor(config: Config) -> Result<()> {
    // An invalid filter is reported here, before the banner is printed.
    let mut monitor = match Monitor::new(&config, SystemClock, io::stdout()) {
        Ok(monitor) => monitor,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    println!("Starting LogMonitor for file: {}", config.log_file.display());
    println!("Monitoring started... (Press Ctrl+C to stop)");

    let mut notifier: Box<dyn ChangeNotifier> = match config.backend {
        WatchBackend::Native => Box::new(FsNotifier::native()),
        WatchBackend::Polling => Box::new(FsNotifier::polling(config.poll_interval)),
    };

    info!(
        path = %config.log_file.display(),
        backend = ?config.backend,
        "Starting file watch"
    );

    if let Err(e) = monitor.run(notifier.as_mut(), wait_for_shutdown()).await {
        error!(error = %e, "Monitor failed");
        return Err(e).context("Monitoring stopped unexpectedly");
    }

    Ok(())
}

/// Initializes the logging subsystem.
///
/// Diagnostics go to stderr so they never interleave with tailed lines on
/// stdout.
fn init_logging(verbose: bool) {
    let directives = if verbose { "warn,logmonitor=debug" } else { "warn" };
    let filter = EnvFilter::new(directives);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
