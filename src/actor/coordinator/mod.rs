//! Actor Coordinator - wires up the engine and the watcher
//!
//! Both actors share one current-thread runtime on a dedicated thread, so the
//! reactive graph never leaves that thread. Everything else reaches it through
//! an `EngineHandle`.

mod runtime;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::engine::{EngineActor, EngineHandle};
use super::fs::FsActor;
use super::messages::EngineMsg;
use crate::document::PageStore;

const CHANNEL_BUFFER: usize = 64;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    store: Arc<dyn PageStore>,
    /// Page directory to watch, with its debounce window
    watch: Option<(PathBuf, Duration)>,
    shutdown_rx: Option<Receiver<()>>,
}

/// Running actor system.
pub struct Running {
    pub handle: EngineHandle,
    pub thread: JoinHandle<()>,
}

impl Coordinator {
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self {
            store,
            watch: None,
            shutdown_rx: None,
        }
    }

    /// Reload documents when files in `dir` change.
    pub fn with_watch(mut self, dir: PathBuf, debounce: Duration) -> Self {
        self.watch = Some((dir, debounce));
        self
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Start the actors on their own thread.
    pub fn start(self) -> Result<Running> {
        let (engine_tx, engine_rx) = mpsc::channel::<EngineMsg>(CHANNEL_BUFFER);

        let (fs_actor, fs_tx) = match &self.watch {
            Some((dir, debounce)) => {
                let (fs_tx, fs_rx) = mpsc::unbounded_channel();
                let actor = FsActor::new(
                    dir,
                    *debounce,
                    fs_rx,
                    engine_tx.clone(),
                    Arc::clone(&self.store),
                )
                .with_context(|| format!("failed to watch {}", dir.display()))?;
                (Some(actor), Some(fs_tx))
            }
            None => (None, None),
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .context("failed to build actor runtime")?;

        let store = self.store;
        let shutdown_rx = self.shutdown_rx;
        let shutdown_tx = engine_tx.clone();
        let thread = std::thread::Builder::new()
            .name("livepage-engine".into())
            .spawn(move || {
                let engine = EngineActor::new(engine_rx, fs_tx, store);
                crate::debug!("actor"; "start");
                runtime.block_on(runtime::run_actors(engine, fs_actor, shutdown_tx, shutdown_rx));
                crate::debug!("actor"; "stopped");
            })
            .context("failed to spawn engine thread")?;

        Ok(Running {
            handle: EngineHandle::new(engine_tx),
            thread,
        })
    }
}
