//! Shared helpers with no knowledge of documents or connections.

pub mod html;
pub mod mime;
