//! Actor Message Definitions
//!
//! ```text
//! HTTP threads --Open/Close/EditPage--> EngineActor <--SourceChanged-- FsActor
//!                                            |                           ^
//!                                            +----------Watch------------+
//! ```

use crossbeam::channel::Receiver;
use tokio::sync::oneshot;

use crate::core::{DocumentName, LiveError};
use crate::document::SubscriptionId;
use crate::stream::Fragment;

/// Reply channel for a request to the engine.
pub type Reply<T> = oneshot::Sender<Result<T, LiveError>>;

/// A freshly registered viewer subscription.
#[derive(Debug)]
pub struct Opened {
    pub id: SubscriptionId,
    /// Pushes for this viewer; the initial document is already queued.
    pub rx: Receiver<Fragment>,
}

// =============================================================================
// EngineActor Messages
// =============================================================================

/// Messages to the Engine Actor
#[derive(Debug)]
pub enum EngineMsg {
    /// Subscribe a new viewer to a document
    Open {
        name: DocumentName,
        reply: Reply<Opened>,
    },
    /// Dispose a viewer's subscription
    Close { id: SubscriptionId },
    /// Render the edit-mode page of a document
    EditPage {
        name: DocumentName,
        reply: Reply<String>,
    },
    /// New content read from disk
    SourceChanged {
        name: DocumentName,
        content: String,
    },
    /// A watched document could not be read; its watch has ended
    SourceFailed {
        name: DocumentName,
        error: LiveError,
    },
    /// Close every subscription and stop
    Shutdown,
}

// =============================================================================
// FsActor Messages
// =============================================================================

/// Messages to the FileSystem Actor
#[derive(Debug)]
pub enum FsMsg {
    /// Start forwarding changes of a document
    Watch(DocumentName),
    /// Stop watching
    Shutdown,
}
