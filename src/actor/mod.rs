//! Actor System
//!
//! ```text
//! FsActor --SourceChanged--> EngineActor --Fragment--> connection writers
//! (watch)                    (reactive graph)          (one thread each)
//! ```
//!
//! - `messages` - Message types for inter-actor communication
//! - `engine` - Registry, subscriptions and the handle used by HTTP threads
//! - `fs` - File system watcher with debouncing
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod engine;
pub mod fs;
pub mod messages;

pub use coordinator::Coordinator;
pub use engine::EngineHandle;
