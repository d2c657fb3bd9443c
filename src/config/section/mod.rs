//! Configuration sections of `livepage.toml`.

mod pages;
mod serve;
mod watch;

pub use pages::PagesConfig;
pub use serve::ServeConfig;
pub use watch::WatchConfig;
