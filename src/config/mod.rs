//! Configuration for `livepage.toml`.
//!
//! ```text
//! config/
//! ├── section/       # [serve], [pages], [watch]
//! ├── types/
//! │   ├── error      # ConfigError
//! │   └── handle     # Global config handle
//! └── mod.rs         # LiveConfig (this file)
//! ```
//!
//! The file is optional: without one, defaults apply and the project root is
//! the current directory. CLI flags override both.
//!
//! | Section    | Purpose                                        |
//! |------------|------------------------------------------------|
//! | `[serve]`  | Interface, port, stream keep-alive interval    |
//! | `[pages]`  | Directory holding the documents                |
//! | `[watch]`  | File watching and its debounce window          |

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{PagesConfig, ServeConfig, WatchConfig};
pub use types::{ConfigError, cfg, init_config};

use crate::{
    cli::{Cli, Commands},
    log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing livepage.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Absolute path to the config file, which may not exist
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory, parent of the config file
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub pages: PagesConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

impl LiveConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// Searches upward from cwd for the config file.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cwd, &cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                config.config_path = path;
                config
            }
            None => {
                crate::debug!("config"; "no {} found, using defaults", cli.config.display());
                Self {
                    config_path: cwd.join(&cli.config),
                    root: cwd,
                    ..Self::default()
                }
            }
        };

        config.apply_command_options(cli);
        config.normalize_paths();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    /// CLI flags take precedence over the file.
    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Serve {
                root,
                interface,
                port,
                watch,
            } => {
                Self::update_option(&mut self.pages.dir, root.as_ref());
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.watch.enabled, watch.as_ref());
            }
            Commands::Render { root, .. } => {
                Self::update_option(&mut self.pages.dir, root.as_ref());
            }
        }
    }

    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve relative paths against the project root.
    fn normalize_paths(&mut self) {
        if self.pages.dir.is_relative() {
            self.pages.dir = self.root.join(&self.pages.dir);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.serve.heartbeat_ms == 0 {
            return Err(ConfigError::Validation("[serve] heartbeat_ms must be greater than 0".into()).into());
        }
        if !self.pages.dir.is_dir() {
            return Err(ConfigError::Validation(format!(
                "page directory `{}` does not exist",
                self.pages.dir.display()
            ))
            .into());
        }
        Ok(())
    }

    /// Directory holding the documents.
    pub fn pages_dir(&self) -> &Path {
        &self.pages.dir
    }
}

#[cfg(test)]
pub fn test_parse_config(content: &str) -> LiveConfig {
    let (parsed, ignored) = LiveConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
