//! Documents: naming, storage, the reactive registry and its observers.
//!
//! ```text
//! PageStore --read--> Registry (Signal<String> -> Memo<Document>)
//!                                                   |
//!                         Subscriptions (Effect per connection) --> PushSink
//! ```

mod annotate;
mod editor;
mod registry;
mod store;
mod subscription;

pub use annotate::{annotate, strip_generated_ids};
#[cfg(test)]
pub use annotate::{ID_PREFIX, is_generated_id};
pub use editor::render_edit_page;
pub use registry::Registry;
#[cfg(test)]
pub use store::MemoryStore;
pub use store::{FsStore, PageStore};
pub use subscription::{SubscriptionId, Subscriptions};
