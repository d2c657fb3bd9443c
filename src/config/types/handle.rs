//! Global config handle.
//!
//! Uses `arc-swap` so request threads read the config without locking.

use crate::config::LiveConfig;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

static CONFIG: LazyLock<ArcSwap<LiveConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(LiveConfig::default()));

#[inline]
pub fn cfg() -> Arc<LiveConfig> {
    CONFIG.load_full()
}

#[inline]
pub fn init_config(config: LiveConfig) -> Arc<LiveConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
