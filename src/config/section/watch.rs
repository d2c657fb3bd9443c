//! `[watch]` section configuration.
//!
//! ```toml
//! [watch]
//! enabled = true      # Push document changes to viewers
//! debounce_ms = 50    # Quiet period that ends a burst of file events
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub enabled: bool,
    pub debounce_ms: u64,
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::test_parse_config;

    #[test]
    fn test_watch_defaults() {
        let config = test_parse_config("");
        assert!(config.watch.enabled);
        assert_eq!(config.watch.debounce(), Duration::from_millis(50));
    }

    #[test]
    fn test_watch_disabled() {
        let config = test_parse_config("[watch]\nenabled = false\ndebounce_ms = 0");
        assert!(!config.watch.enabled);
        assert_eq!(config.watch.debounce(), Duration::ZERO);
    }
}
