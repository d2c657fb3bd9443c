//! FileSystem Actor
//!
//! Watches the page directory and feeds the engine fresh content of every
//! watched document that changed.
//!
//! ```text
//! notify → Debouncer (timing, dedup) → path → DocumentName → read → EngineMsg
//! ```
//!
//! The watcher is attached before the first document is opened, so a change
//! racing with an initial read is still observed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::RecommendedWatcher;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::mpsc;

use super::messages::{EngineMsg, FsMsg};
use crate::core::DocumentName;
use crate::document::PageStore;

mod debouncer;
mod watch_roots;

#[cfg(test)]
mod tests;

use debouncer::{ChangeKind, Debouncer};
use watch_roots::WatchRoots;

/// How often a detached page directory is looked for.
const REATTACH_INTERVAL: Duration = Duration::from_secs(1);

/// FileSystem Actor - watches for document changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    watch_roots: WatchRoots,
    rx: mpsc::UnboundedReceiver<FsMsg>,
    engine_tx: mpsc::Sender<EngineMsg>,
    debouncer: Debouncer,
    store: Arc<dyn PageStore>,
    dir: PathBuf,
    /// Documents whose changes are forwarded
    watched: FxHashSet<DocumentName>,
}

impl FsActor {
    /// Start watching `dir` immediately; events buffer until `run`.
    pub fn new(
        dir: &Path,
        debounce: Duration,
        rx: mpsc::UnboundedReceiver<FsMsg>,
        engine_tx: mpsc::Sender<EngineMsg>,
        store: Arc<dyn PageStore>,
    ) -> notify::Result<Self> {
        let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut watch_roots = WatchRoots::new(dir.clone());
        watch_roots.attach(&mut watcher)?;

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            rx,
            engine_tx,
            debouncer: Debouncer::new(debounce),
            store,
            dir,
            watched: FxHashSet::default(),
        })
    }

    /// Run the actor event loop
    pub async fn run(self) {
        let Self {
            notify_rx,
            mut watcher,
            mut watch_roots,
            mut rx,
            engine_tx,
            mut debouncer,
            store,
            dir,
            mut watched,
        } = self;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // notify delivers on its own thread through a std channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            let sleep = if watch_roots.is_attached() {
                debouncer.sleep_duration()
            } else {
                debouncer.sleep_duration().min(REATTACH_INTERVAL)
            };

            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Some(FsMsg::Watch(name)) => {
                        crate::debug!("watch"; "watching {}", name);
                        watched.insert(name);
                    }
                    Some(FsMsg::Shutdown) | None => break,
                },
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(sleep) => {
                    watch_roots.maintain(&mut watcher);
                    let Some(changes) = debouncer.take_if_ready() else {
                        continue;
                    };
                    let names = changed_documents(&dir, changes, &watched);
                    if forward(names, &mut watched, store.as_ref(), &engine_tx).await.is_err() {
                        break;
                    }
                }
            }
        }
        crate::debug!("watch"; "stopped");
    }
}

/// Watched documents touched by a batch of changes, in name order.
fn changed_documents(
    dir: &Path,
    changes: FxHashMap<PathBuf, ChangeKind>,
    watched: &FxHashSet<DocumentName>,
) -> Vec<DocumentName> {
    let mut names: Vec<_> = changes
        .into_keys()
        .filter_map(|path| DocumentName::from_path(dir, &path))
        .filter(|name| watched.contains(name))
        .collect();
    names.sort();
    names
}

/// Read each changed document and hand the content to the engine.
///
/// A document that cannot be read is reported once and dropped from
/// `watched`. Returns `Err(())` if the engine is gone.
async fn forward(
    names: Vec<DocumentName>,
    watched: &mut FxHashSet<DocumentName>,
    store: &dyn PageStore,
    engine_tx: &mpsc::Sender<EngineMsg>,
) -> Result<(), ()> {
    for name in names {
        let msg = match store.read(&name) {
            Ok(content) => EngineMsg::SourceChanged { name, content },
            Err(error) => {
                watched.remove(&name);
                EngineMsg::SourceFailed { name, error }
            }
        };
        engine_tx.send(msg).await.map_err(|_| ())?;
    }
    Ok(())
}
