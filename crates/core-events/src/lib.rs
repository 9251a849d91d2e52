//! Filesystem change notifications for the current working directory.
//!
//! A `notify` watcher (inotify on Linux, kqueue on the BSDs) relays events
//! into a crossbeam channel through a closure handler. The REPL never blocks
//! on it: `take_pending` drains the channel at prompt re-entry and reports
//! whether a refresh is due. Platforms without a backend degrade to a no-op.

use std::path::{Path, PathBuf};

use crossbeam_channel::{unbounded, Receiver, Sender};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

fn is_mutation(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

pub struct FsWatcher {
    watcher: Option<RecommendedWatcher>,
    rx: Receiver<()>,
    tx: Sender<()>,
    watched: Option<PathBuf>,
}

impl FsWatcher {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            watcher: None,
            rx,
            tx,
            watched: None,
        }
    }

    /// Watch `dir` (non-recursive), replacing any previous watch. A watcher
    /// that cannot be created or armed is logged and disabled; the session
    /// falls back to manual refreshes.
    pub fn arm(&mut self, dir: &Path) {
        if self.watcher.is_none() {
            let tx = self.tx.clone();
            match notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
                if let Ok(ev) = res {
                    if is_mutation(&ev.kind) {
                        let _ = tx.send(());
                    }
                }
            }) {
                Ok(w) => self.watcher = Some(w),
                Err(e) => {
                    warn!(target: "events", error = %e, "no filesystem watcher available");
                    return;
                }
            }
        }
        let Some(watcher) = self.watcher.as_mut() else {
            return;
        };
        if let Some(old) = self.watched.take() {
            let _ = watcher.unwatch(&old);
        }
        match watcher.watch(dir, RecursiveMode::NonRecursive) {
            Ok(()) => {
                debug!(target: "events", dir = %dir.display(), "watching directory");
                self.watched = Some(dir.to_path_buf());
            }
            Err(e) => {
                warn!(target: "events", dir = %dir.display(), error = %e, "watch failed");
            }
        }
        // Drop notifications queued for the previous directory.
        while self.rx.try_recv().is_ok() {}
    }

    /// Drain queued notifications; true when at least one arrived.
    pub fn take_pending(&self) -> bool {
        let mut pending = false;
        while self.rx.try_recv().is_ok() {
            pending = true;
        }
        pending
    }
}

impl Default for FsWatcher {
    fn default() -> Self {
        Self::new()
    }
}
