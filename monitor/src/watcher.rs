//! File system change notifications.
//!
//! This module provides the [`ChangeNotifier`] capability used by the monitor
//! to learn when the tailed file may have new content. The notifier watches the
//! file's directory non-recursively and forwards lightweight [`ChangeEvent`]s
//! into a tokio channel; it never touches file contents itself.
//!
//! # Architecture
//!
//! [`FsNotifier`] wraps any [`notify::Watcher`]. Two backends are provided:
//!
//! - [`FsNotifier::native`]: the platform watcher (inotify, FSEvents,
//!   ReadDirectoryChangesW) via [`RecommendedWatcher`]
//! - [`FsNotifier::polling`]: a [`PollWatcher`] that rescans on an interval,
//!   for filesystems where native events are not delivered
//!
//! The notify callback runs on the backend's own thread. It only maps the
//! event and calls `try_send`, so a slow consumer can never stall the watcher.
//! Dropped events are harmless: the next delivered event re-reads everything
//! that has not been consumed yet.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use tokio::sync::mpsc;
//! use logmonitor::watcher::{ChangeNotifier, FsNotifier};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (tx, mut rx) = mpsc::channel(100);
//!     let mut notifier = FsNotifier::native();
//!     notifier.subscribe(Path::new("/var/log"), tx)?;
//!
//!     while let Some(event) = rx.recv().await {
//!         println!("{:?} {}", event.kind, event.path.display());
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{
    Config, Event, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher,
};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};

/// Default interval for the polling backend.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// What happened to a path inside the watched directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// A change notification for a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// Errors that can occur while establishing or tearing down a watch.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to initialize the file system watcher.
    #[error("failed to create watcher: {0}")]
    WatcherInit(#[source] notify::Error),

    /// The directory could not be watched or unwatched.
    #[error("failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// A subscription is already active on this notifier.
    #[error("notifier is already subscribed to {0}")]
    AlreadySubscribed(PathBuf),
}

/// Result type for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Capability for receiving change notifications about a directory.
pub trait ChangeNotifier {
    /// Starts delivering non-recursive change events for `directory` into
    /// `sender`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying watcher cannot be created or the
    /// directory cannot be watched.
    fn subscribe(&mut self, directory: &Path, sender: mpsc::Sender<ChangeEvent>) -> Result<()>;

    /// Stops delivering events. Calling this without an active subscription
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to release the watch.
    fn unsubscribe(&mut self) -> Result<()>;
}

/// [`ChangeNotifier`] backed by a [`notify`] watcher.
#[derive(Debug)]
pub struct FsNotifier<W: Watcher> {
    config: Config,
    /// Kept alive for the lifetime of the subscription; dropping it stops
    /// event delivery.
    watcher: Option<W>,
    directory: Option<PathBuf>,
}

impl FsNotifier<RecommendedWatcher> {
    /// Notifier using the platform's native event API.
    #[must_use]
    pub fn native() -> Self {
        Self::with_config(Config::default())
    }
}

impl FsNotifier<PollWatcher> {
    /// Notifier that rescans the directory every `interval`.
    ///
    /// File contents are hashed on every scan. Modification times are only
    /// compared at whole-second resolution, so an append landing in the same
    /// second as the previous scan would otherwise go unreported.
    #[must_use]
    pub fn polling(interval: Duration) -> Self {
        Self::with_config(
            Config::default()
                .with_poll_interval(interval)
                .with_compare_contents(true),
        )
    }
}

impl<W: Watcher> FsNotifier<W> {
    /// Notifier with an explicit backend configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            watcher: None,
            directory: None,
        }
    }

    /// Directory of the active subscription, if any.
    #[must_use]
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Returns true while a subscription is active.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.watcher.is_some()
    }
}

impl<W: Watcher> ChangeNotifier for FsNotifier<W> {
    fn subscribe(&mut self, directory: &Path, sender: mpsc::Sender<ChangeEvent>) -> Result<()> {
        if let Some(existing) = &self.directory {
            return Err(WatcherError::AlreadySubscribed(existing.clone()));
        }

        let mut watcher = W::new(
            move |res: notify::Result<Event>| {
                handle_notify_event(res, &sender);
            },
            self.config,
        )
        .map_err(WatcherError::WatcherInit)?;

        watcher
            .watch(directory, RecursiveMode::NonRecursive)
            .map_err(|source| WatcherError::Watch {
                path: directory.to_path_buf(),
                source,
            })?;

        debug!(directory = %directory.display(), "Started directory watch");

        self.watcher = Some(watcher);
        self.directory = Some(directory.to_path_buf());
        Ok(())
    }

    fn unsubscribe(&mut self) -> Result<()> {
        let (Some(mut watcher), Some(directory)) = (self.watcher.take(), self.directory.take())
        else {
            return Ok(());
        };

        watcher
            .unwatch(&directory)
            .map_err(|source| WatcherError::Watch {
                path: directory.clone(),
                source,
            })?;

        debug!(directory = %directory.display(), "Stopped directory watch");
        Ok(())
    }
}

/// Maps a notify event kind onto the changes the monitor cares about.
fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(_) | EventKind::Any => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        EventKind::Access(_) | EventKind::Other => None,
    }
}

/// Handles events from the notify crate.
///
/// Runs on the backend thread, so it only filters and forwards.
fn handle_notify_event(res: notify::Result<Event>, sender: &mpsc::Sender<ChangeEvent>) {
    let event = match res {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, "File watcher error");
            return;
        }
    };

    trace!(kind = ?event.kind, paths = ?event.paths, "Received notify event");

    let Some(kind) = change_kind(&event.kind) else {
        trace!(kind = ?event.kind, "Ignoring event kind");
        return;
    };

    for path in event.paths {
        if let Err(e) = sender.try_send(ChangeEvent { path, kind }) {
            warn!(error = %e, "Failed to queue change event, channel may be full");
        }
    }
}
