pub mod snapshot;

use std::path::PathBuf;
use std::time::Duration;

use crate::shutdown::ShutdownToken;
use snapshot::FileSnapshot;

/// Result of waiting for the watched tree to change and settle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOutcome {
    /// A change was detected and the tree then stayed quiet for one full
    /// polling interval. Carries the path that first tripped detection
    /// (informational only).
    Settled { first_change: PathBuf },
    /// Shutdown was triggered while waiting.
    Cancelled,
}

/// Polls the filesystem for changes to a set of watched files.
///
/// The watch set is re-derived on every snapshot and every poll, so files
/// added or removed mid-cycle are seen without restarting the watcher.
/// There are no error cases: a path that cannot be stat'ed is a change
/// signal, not a failure.
pub struct ChangeWatcher<F>
where
    F: Fn() -> Vec<PathBuf>,
{
    watch_set: F,
    poll_interval: Duration,
}

impl<F> ChangeWatcher<F>
where
    F: Fn() -> Vec<PathBuf>,
{
    pub fn new(watch_set: F, poll_interval: Duration) -> Self {
        Self {
            watch_set,
            poll_interval,
        }
    }

    /// Capture the current watch set's modification times.
    pub fn snapshot(&self) -> FileSnapshot {
        FileSnapshot::capture(&(self.watch_set)())
    }

    /// Compare the current filesystem state against `snapshot` and return
    /// the first changed path, or `None` when nothing changed.
    ///
    /// A path counts as changed when it appeared since the snapshot, when
    /// its mtime is strictly newer than recorded, or when a recorded path
    /// no longer exists. The returned path is the first hit in watch-set
    /// order; callers only use it for logging.
    pub fn poll_once(&self, snapshot: &FileSnapshot) -> Option<PathBuf> {
        for path in (self.watch_set)() {
            match snapshot.mtime(&path) {
                None => return Some(path),
                Some(recorded) => match std::fs::metadata(&path).and_then(|m| m.modified()) {
                    // Vanished between the walk and the stat: change signal.
                    Err(_) => return Some(path),
                    Ok(current) if current > recorded => return Some(path),
                    Ok(_) => {}
                },
            }
        }

        // Recorded paths that dropped out of the watch set entirely.
        for path in snapshot.paths() {
            if !path.exists() {
                return Some(path.clone());
            }
        }

        None
    }

    /// Block until a change is detected and the tree then stays quiet for
    /// one full polling interval.
    ///
    /// Editors that write a file several times per save, and checkouts that
    /// touch many files in a burst, keep refreshing the settle window; the
    /// run only starts once a whole interval passes with no further change.
    pub async fn wait_for_settled_change(&self, shutdown: &ShutdownToken) -> SettleOutcome {
        let mut snapshot = self.snapshot();

        let first_change = loop {
            if shutdown.is_cancelled() {
                return SettleOutcome::Cancelled;
            }
            if let Some(path) = self.poll_once(&snapshot) {
                break path;
            }
            if shutdown.cancelled_within(self.poll_interval).await {
                return SettleOutcome::Cancelled;
            }
        };
        announce_change(&first_change);

        snapshot = self.snapshot();
        loop {
            if shutdown.cancelled_within(self.poll_interval).await {
                return SettleOutcome::Cancelled;
            }
            match self.poll_once(&snapshot) {
                Some(path) => {
                    announce_change(&path);
                    snapshot = self.snapshot();
                }
                None => return SettleOutcome::Settled { first_change },
            }
        }
    }
}

/// Console notice for a detected change; part of the operator-facing
/// protocol, so it goes to stdout rather than the log.
fn announce_change(path: &std::path::Path) {
    println!("{} changed", path.display());
}
