//! Outbound push transport: Datastar SSE over a plain HTTP response.
//!
//! - `sse` - event encoding
//! - `channel` - engine-to-writer push channel
//! - `connection` - cancellation, lifecycle, writer loop
//! - `signals` - inbound Datastar signals
//! - `demo` - scripted quiz stream

mod channel;
mod connection;
pub mod demo;
mod signals;
mod sse;

pub use channel::{PushSink, channel};
pub use connection::{Connection, Release};
pub use signals::Signals;
pub use sse::{Fragment, MergeMode};
