//! Core types - pure abstractions shared across the codebase.

mod error;
mod name;
mod state;

pub use error::LiveError;
pub use name::DocumentName;
pub use state::{is_shutdown, register_server, setup_shutdown_handler};
