//! Unified path management for CardKit's local files.
//!
//! Everything the editor persists lives under the platform config and data
//! directories:
//!
//! ```text
//! ~/.config/cardkit/           # Config directory
//! └── config.toml              # Editor configuration
//!
//! ~/.local/share/cardkit/      # Data directory
//! ├── cards.db                 # Card record store (SQLite)
//! └── slots/                   # Flat key-value slots (history cache)
//! ```

use std::path::{Path, PathBuf};

use cardkit_core::error::{CardError, Result};

const APP_DIR: &str = "cardkit";

/// Resolved filesystem locations for one application instance.
#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AppPaths {
    /// Resolves the platform-appropriate directories.
    ///
    /// # Errors
    ///
    /// Returns a config error when the platform directories cannot be
    /// determined (no home directory).
    pub fn resolve() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CardError::config("cannot determine config directory"))?
            .join(APP_DIR);
        let data_dir = dirs::data_dir()
            .ok_or_else(|| CardError::config("cannot determine data directory"))?
            .join(APP_DIR);
        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// Returns paths rooted at an explicit data directory, keeping the
    /// resolved config directory. Used for the config-file override and for
    /// tests.
    pub fn with_data_dir(self, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..self
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the editor configuration file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Path of the card record store database.
    pub fn database_file(&self) -> PathBuf {
        self.data_dir.join("cards.db")
    }

    /// Directory the flat key-value slots live in.
    pub fn slot_dir(&self) -> PathBuf {
        self.data_dir.join("slots")
    }
}
