//! `[pages]` section configuration.
//!
//! ```toml
//! [pages]
//! dir = "page"    # Directory holding the served documents
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PagesConfig {
    /// Relative paths are resolved against the project root.
    pub dir: PathBuf,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("page"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::config::test_parse_config;

    #[test]
    fn test_pages_dir() {
        assert_eq!(test_parse_config("").pages.dir, PathBuf::from("page"));
        assert_eq!(
            test_parse_config("[pages]\ndir = \"docs\"").pages.dir,
            PathBuf::from("docs")
        );
    }
}
