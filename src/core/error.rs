//! Error taxonomy for documents and connections.

use std::io;

use thiserror::Error;

use super::DocumentName;

/// Errors local to one document or one connection.
#[derive(Debug, Error)]
pub enum LiveError {
    /// Backing content missing or unreadable. Fatal to that document's watcher.
    #[error("source unavailable: `{name}`")]
    SourceUnavailable {
        name: DocumentName,
        #[source]
        source: io::Error,
    },

    /// Inbound request payload failed validation; the stream is never opened.
    #[error("malformed signal: {0}")]
    MalformedSignal(String),

    /// Writing to a push channel failed; the connection is torn down.
    #[error("push channel closed")]
    ChannelFault,

    /// The engine actor is no longer running.
    #[error("engine stopped")]
    EngineGone,
}

impl LiveError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedSignal(message.into())
    }

    /// HTTP status for a request that failed with this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::SourceUnavailable { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                404
            }
            Self::SourceUnavailable { .. } => 500,
            Self::MalformedSignal(_) => 400,
            Self::ChannelFault => 500,
            Self::EngineGone => 503,
        }
    }
}
