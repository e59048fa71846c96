//! Configuration loading and management
//!
//! Hosts can tune the state core through a small TOML file (conventionally
//! `tabula.toml`). Every field has a default, and a missing file means the
//! default configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::DEFAULT_COLUMN_COLOR;
use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Quiet period, in milliseconds, before a burst of text edits commits
    /// to the revision log
    #[serde(default = "default_commit_delay_ms")]
    pub commit_delay_ms: u64,

    /// Autosave setting for boards created from scratch
    #[serde(default)]
    pub default_autosave: bool,

    /// Color given to columns created without an explicit color
    #[serde(default = "default_column_color")]
    pub default_column_color: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            commit_delay_ms: default_commit_delay_ms(),
            default_autosave: false,
            default_column_color: default_column_color(),
        }
    }
}

fn default_commit_delay_ms() -> u64 {
    1000
}

fn default_column_color() -> String {
    DEFAULT_COLUMN_COLOR.to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load configuration from `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Config> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// The commit quiet period as a `Duration`
    pub fn commit_delay(&self) -> Duration {
        Duration::from_millis(self.commit_delay_ms)
    }
}
