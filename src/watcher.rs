//! Filesystem watcher lifecycle.
//!
//! Wraps a recursive `notify` watcher on the analyzed tree. Events are
//! drained on a background thread and recorded as pending changes; the
//! next analyze picks them up by re-walking the tree, so the watcher only
//! needs to know that something changed, not what. `stop` is idempotent.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::errors::{AnalyzerError, Result};

pub struct FileWatcher {
    root: PathBuf,
    // Dropping the watcher unregisters the OS-level watches.
    _watcher: RecommendedWatcher,
    running: Arc<AtomicBool>,
    pending_events: Arc<AtomicU64>,
    drain: Option<JoinHandle<()>>,
}

impl FileWatcher {
    /// Starts watching `root` recursively.
    pub fn start(root: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<notify::Result<notify::Event>>();
        let mut watcher =
            notify::recommended_watcher(tx).map_err(|e| AnalyzerError::Config {
                message: format!("failed to create file watcher: {e}"),
            })?;
        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| AnalyzerError::Config {
                message: format!("failed to watch {}: {e}", root.display()),
            })?;

        let running = Arc::new(AtomicBool::new(true));
        let pending_events = Arc::new(AtomicU64::new(0));

        let drain_running = Arc::clone(&running);
        let drain_pending = Arc::clone(&pending_events);
        let drain = std::thread::spawn(move || {
            // Receiver closes when the watcher is dropped on stop.
            while let Ok(event) = rx.recv() {
                if !drain_running.load(Ordering::Relaxed) {
                    break;
                }
                match event {
                    Ok(event) => {
                        debug!(?event.kind, "filesystem event");
                        drain_pending.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => warn!(error = %e, "file watcher error"),
                }
            }
        });

        Ok(Self {
            root: root.to_path_buf(),
            _watcher: watcher,
            running,
            pending_events,
            drain: Some(drain),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Number of filesystem events seen since the watch started.
    pub fn pending_events(&self) -> u64 {
        self.pending_events.load(Ordering::Relaxed)
    }

    /// Stops the watcher. Safe to call more than once.
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::Relaxed) {
            return;
        }
        if let Some(handle) = self.drain.take() {
            // The drain thread exits when the channel sender side drops;
            // the watcher itself drops with self, so don't block on join
            // here beyond what has already been queued.
            drop(handle);
        }
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_and_stop() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut watcher = FileWatcher::start(dir.path()).unwrap();
        assert!(watcher.is_running());
        watcher.stop();
        assert!(!watcher.is_running());
        // Idempotent.
        watcher.stop();
        assert!(!watcher.is_running());
    }

    #[test]
    fn test_watch_missing_directory_fails() {
        let result = FileWatcher::start(Path::new("/nonexistent/surely/missing"));
        assert!(result.is_err());
    }
}
