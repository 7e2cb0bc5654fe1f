//! Editor configuration.
//!
//! Loaded from `config.toml` under the platform config directory. A missing
//! or empty file yields defaults; a file that exists but cannot be read or
//! parsed is an error rather than a silent fallback.

use std::fs;
use std::path::{Path, PathBuf};

use cardkit_core::error::{CardError, Result};
use serde::Deserialize;

use crate::history_cache::DEFAULT_HISTORY_LIMIT;

/// Application-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum entries retained by the session history cache.
    pub history_limit: usize,
    /// Overrides the platform data directory (card store and slots).
    pub data_dir: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            data_dir: None,
        }
    }
}

impl EditorConfig {
    /// Loads the configuration from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| CardError::config(format!("failed to read {}: {e}", path.display())))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config = toml::from_str(&content)?;
        Ok(config)
    }
}
