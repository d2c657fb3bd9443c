use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

/// Keeps the page directory attached to the watcher.
///
/// Watching the directory rather than each file keeps rename-replace saves
/// visible. A directory that disappears is re-attached once it exists again.
pub(super) struct WatchRoots {
    dir: PathBuf,
    attached: bool,
}

impl WatchRoots {
    pub(super) fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            attached: false,
        }
    }

    pub(super) fn attach(&mut self, watcher: &mut RecommendedWatcher) -> notify::Result<()> {
        if self.dir.exists() {
            watcher.watch(&self.dir, RecursiveMode::NonRecursive)?;
            self.attached = true;
        }
        Ok(())
    }

    pub(super) fn is_attached(&self) -> bool {
        self.attached
    }

    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) {
        if self.attached && !self.dir.exists() {
            self.attached = false;
            crate::debug!("watch"; "lost watch: {}", self.dir.display());
        }
        if !self.attached && self.dir.exists() && self.attach(watcher).is_ok() {
            crate::debug!("watch"; "re-attached watch: {}", self.dir.display());
        }
    }
}
