use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify::Watcher;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind, Debouncer};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::event::Event;
use crate::extension::Disposable;
use crate::fs::search::PatternMatcher;

/// Default flood threshold (events per debounce window).
pub const DEFAULT_FLOOD_THRESHOLD: usize = 100;

/// What happened to a watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Created or modified; the path exists at delivery time.
    Changed,
    /// The path no longer exists.
    Removed,
}

/// One file change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl FileChange {
    /// Classify `path` by whether it still exists.
    pub fn observe(path: PathBuf) -> Self {
        let kind = if path.exists() {
            ChangeKind::Changed
        } else {
            ChangeKind::Removed
        };
        Self { path, kind }
    }
}

/// Filesystem watcher over every workspace root.
pub struct FsWatcher {
    /// Whether the watcher is currently forwarding events.
    active: Arc<AtomicBool>,
    /// Handle to the debouncer; taken on dispose to stop watching.
    debouncer: Option<Debouncer<notify::RecommendedWatcher>>,
}

impl FsWatcher {
    /// Create a new FsWatcher that watches each of `roots` recursively.
    ///
    /// Events are debounced by `debounce_duration` and sent via `event_tx` as
    /// one [`Event::FsChange`] per window. Only paths `matcher` accepts under
    /// some root are reported; directories are dropped. More than
    /// `flood_threshold` changes in one window collapse into a single
    /// [`Event::FsRescan`].
    pub fn new(
        roots: &[PathBuf],
        debounce_duration: Duration,
        matcher: PatternMatcher,
        flood_threshold: usize,
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> Result<Self> {
        let active = Arc::new(AtomicBool::new(true));
        let active_clone = active.clone();
        let watched = roots.to_vec();

        let mut debouncer = new_debouncer(
            debounce_duration,
            move |result: std::result::Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>| {
                if !active_clone.load(Ordering::Relaxed) {
                    return;
                }

                match result {
                    Ok(events) => {
                        let mut paths: Vec<PathBuf> = events
                            .into_iter()
                            .filter(|e| e.kind == DebouncedEventKind::Any)
                            .map(|e| e.path)
                            .filter(|p| is_reported(p, &watched, &matcher))
                            .filter(|p| !p.is_dir())
                            .collect();
                        paths.dedup();

                        if paths.is_empty() {
                            return;
                        }

                        let event = if paths.len() > flood_threshold {
                            debug!(count = paths.len(), "change flood, requesting rescan");
                            Event::FsRescan
                        } else {
                            Event::FsChange(paths.into_iter().map(FileChange::observe).collect())
                        };
                        let _ = event_tx.send(event);
                    }
                    Err(err) => {
                        warn!(error = %err, "watcher error");
                    }
                }
            },
        )?;

        for root in roots {
            debouncer
                .watcher()
                .watch(root, notify::RecursiveMode::Recursive)?;
            debug!(root = %root.display(), "watching");
        }

        Ok(Self {
            active,
            debouncer: Some(debouncer),
        })
    }

    /// Pause event forwarding (watches stay registered).
    pub fn pause(&self) {
        self.active.store(false, Ordering::Relaxed);
    }

    /// Resume event forwarding.
    pub fn resume(&self) {
        self.active.store(true, Ordering::Relaxed);
    }

    /// Check if the watcher is currently active (forwarding events).
    pub fn is_active(&self) -> bool {
        self.debouncer.is_some() && self.active.load(Ordering::Relaxed)
    }
}

impl Disposable for FsWatcher {
    fn dispose(&mut self) {
        self.active.store(false, Ordering::Relaxed);
        if self.debouncer.take().is_some() {
            debug!("watcher disposed");
        }
    }
}

/// Whether `path` matches under any watched root.
pub fn is_reported(path: &Path, roots: &[PathBuf], matcher: &PatternMatcher) -> bool {
    roots.iter().any(|root| matcher.matches_under(root, path))
}
