//! Engine Actor - owner of all reactive state
//!
//! Runs on a single thread. Every cell write settles the whole graph (memos
//! marked stale, effects re-run, fragments queued) before the next message is
//! taken, so pushes for one viewer are strictly ordered.
//!
//! ```text
//! Open ──► Registry::ensure ──(first time)──► PageStore::read + FsMsg::Watch
//!      └─► Subscriptions::open ──► initial push
//! SourceChanged ──► Registry::write ──► effects ──► pushes
//! SourceFailed ──► unwatched ──(next Open/EditPage)──► re-read or 404
//! ```

use std::rc::Rc;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tokio::sync::{mpsc, oneshot};

use super::messages::{EngineMsg, FsMsg, Opened};
use crate::core::{DocumentName, LiveError};
use crate::document::{PageStore, Registry, SubscriptionId, Subscriptions, render_edit_page};
use crate::stream::{Release, channel};

/// Reactive state and the operations on it, free of any runtime.
pub struct Engine {
    store: Arc<dyn PageStore>,
    registry: Registry,
    subscriptions: Subscriptions,
    /// Loaded documents whose source failed and is no longer watched.
    unwatched: FxHashSet<DocumentName>,
}

impl Engine {
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self {
            store,
            registry: Registry::new(),
            subscriptions: Subscriptions::new(),
            unwatched: FxHashSet::default(),
        }
    }

    /// Subscribe a viewer to `name`.
    ///
    /// Returns the subscription and whether the document was loaded by this
    /// call (and so needs a watch).
    pub fn open(&mut self, name: &DocumentName) -> Result<(Opened, bool), LiveError> {
        let recovered = self.recover(name)?;
        let store = Arc::clone(&self.store);
        let (entry, created) = self.registry.ensure(name, || store.read(name))?;
        let entry = entry.clone();

        let (sink, rx) = channel();
        let id = self.subscriptions.open(name.clone(), &entry, Rc::new(sink));
        crate::debug!("engine"; "{} opened {} ({} viewers)", id, name, self.subscriptions.count_for(name));
        Ok((Opened { id, rx }, created || recovered))
    }

    pub fn close(&mut self, id: SubscriptionId) -> bool {
        let closed = self.subscriptions.close(id);
        if closed {
            crate::debug!("engine"; "{} closed ({} open)", id, self.subscriptions.count());
        }
        closed
    }

    /// Edit-mode page of `name`, from the current snapshot.
    pub fn edit_page(&mut self, name: &DocumentName) -> Result<(String, bool), LiveError> {
        let recovered = self.recover(name)?;
        let store = Arc::clone(&self.store);
        let (entry, created) = self.registry.ensure(name, || store.read(name))?;
        let snapshot = entry.dom().get_untracked();
        Ok((render_edit_page(name, &snapshot), created || recovered))
    }

    /// Re-read a document whose source failed before serving it again.
    ///
    /// Still unreadable: the error is returned and the old snapshot is not
    /// served. Readable: the content is written through to current viewers,
    /// and `true` tells the caller to watch it again.
    fn recover(&mut self, name: &DocumentName) -> Result<bool, LiveError> {
        if !self.unwatched.contains(name) {
            return Ok(false);
        }
        let content = self.store.read(name)?;
        self.unwatched.remove(name);
        self.source_changed(name, content);
        Ok(true)
    }

    /// Replace the content of a loaded document.
    pub fn source_changed(&mut self, name: &DocumentName, content: String) {
        if self.registry.write(name, content) {
            crate::logger::status_success(&format!(
                "reloaded: {} ({} viewers)",
                name,
                self.subscriptions.count_for(name)
            ));
        }
        self.reap();
    }

    pub fn source_failed(&mut self, name: &DocumentName, error: &LiveError) {
        let detail = std::error::Error::source(error)
            .map(ToString::to_string)
            .unwrap_or_default();
        crate::logger::status_error(&format!("unavailable: {name}, no longer watched"), &detail);
        if self.registry.contains(name) {
            self.unwatched.insert(name.clone());
        }
    }

    /// Close subscriptions whose channel broke during the last push.
    fn reap(&mut self) {
        for id in self.subscriptions.reap_faulted() {
            crate::debug!("engine"; "{} closed after push failure", id);
        }
    }

    pub fn shutdown(&mut self) {
        let closed = self.subscriptions.close_all();
        crate::debug!("engine"; "closed {} subscriptions", closed);
    }

    #[cfg(test)]
    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    #[cfg(test)]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Engine Actor - applies messages to an `Engine` in arrival order
pub struct EngineActor {
    rx: mpsc::Receiver<EngineMsg>,
    fs_tx: Option<mpsc::UnboundedSender<FsMsg>>,
    engine: Engine,
}

impl EngineActor {
    pub fn new(
        rx: mpsc::Receiver<EngineMsg>,
        fs_tx: Option<mpsc::UnboundedSender<FsMsg>>,
        store: Arc<dyn PageStore>,
    ) -> Self {
        Self {
            rx,
            fs_tx,
            engine: Engine::new(store),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            if !self.handle(msg) {
                break;
            }
        }
        self.engine.shutdown();
        if let Some(tx) = &self.fs_tx {
            let _ = tx.send(FsMsg::Shutdown);
        }
        crate::debug!("engine"; "stopped");
    }

    /// Apply one message. Returns `false` once the actor should stop.
    fn handle(&mut self, msg: EngineMsg) -> bool {
        match msg {
            EngineMsg::Open { name, reply } => {
                let result = self.engine.open(&name).map(|(opened, created)| {
                    self.watch_if(created, &name);
                    opened
                });
                // A requester that gave up drops the receiver; its subscription
                // would never be closed by anyone else.
                if let Err(Ok(opened)) = reply.send(result) {
                    self.engine.close(opened.id);
                }
            }
            EngineMsg::Close { id } => {
                self.engine.close(id);
            }
            EngineMsg::EditPage { name, reply } => {
                let result = self.engine.edit_page(&name).map(|(page, created)| {
                    self.watch_if(created, &name);
                    page
                });
                let _ = reply.send(result);
            }
            EngineMsg::SourceChanged { name, content } => {
                self.engine.source_changed(&name, content);
            }
            EngineMsg::SourceFailed { name, error } => {
                self.engine.source_failed(&name, &error);
            }
            EngineMsg::Shutdown => return false,
        }
        true
    }

    fn watch_if(&self, created: bool, name: &DocumentName) {
        if !created {
            return;
        }
        if let Some(tx) = &self.fs_tx
            && tx.send(FsMsg::Watch(name.clone())).is_err()
        {
            crate::log!("watch"; "watcher stopped, {} will not reload", name);
        }
    }
}

/// Handle to the engine for threads outside its runtime.
///
/// Every call blocks until the engine has processed the request.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineMsg>,
}

impl EngineHandle {
    pub fn new(tx: mpsc::Sender<EngineMsg>) -> Self {
        Self { tx }
    }

    pub fn open(&self, name: DocumentName) -> Result<Opened, LiveError> {
        self.request(|reply| EngineMsg::Open { name, reply })
    }

    pub fn edit_page(&self, name: DocumentName) -> Result<String, LiveError> {
        self.request(|reply| EngineMsg::EditPage { name, reply })
    }

    pub fn close(&self, id: SubscriptionId) {
        let _ = self.tx.blocking_send(EngineMsg::Close { id });
    }

    pub fn shutdown(&self) {
        let _ = self.tx.blocking_send(EngineMsg::Shutdown);
    }

    fn request<T>(
        &self,
        msg: impl FnOnce(oneshot::Sender<Result<T, LiveError>>) -> EngineMsg,
    ) -> Result<T, LiveError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .blocking_send(msg(reply))
            .map_err(|_| LiveError::EngineGone)?;
        rx.blocking_recv().map_err(|_| LiveError::EngineGone)?
    }
}

impl Release for EngineHandle {
    fn release(&self, id: SubscriptionId) {
        self.close(id);
    }
}
