//! Path resolution for engojee configuration and data files.
//!
//! All engojee data is stored in `~/.engojee/` (or `$ENGOJEE_HOME`):
//! - `config.yaml` - Main configuration file
//! - `engojee.db` - `SQLite` key-value store holding the rule collection

use std::path::PathBuf;

use crate::error::EngojeeError;

/// Environment variable overriding the data root.
pub const HOME_ENV: &str = "ENGOJEE_HOME";

/// Paths to engojee configuration and data files.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root directory: `~/.engojee/`
    pub root: PathBuf,
    /// Config file: `~/.engojee/config.yaml`
    pub config_file: PathBuf,
    /// Database file: `~/.engojee/engojee.db`
    pub database: PathBuf,
}

impl Paths {
    /// Resolve paths from `$ENGOJEE_HOME`, falling back to `$HOME/.engojee`.
    ///
    /// # Errors
    ///
    /// Returns an error if neither variable is set.
    pub fn new() -> Result<Self, EngojeeError> {
        if let Some(root) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::with_root(PathBuf::from(root)));
        }

        let home = std::env::var("HOME").map_err(|_| {
            EngojeeError::Config("Could not determine home directory".to_string())
        })?;

        Ok(Self::with_root(PathBuf::from(home).join(".engojee")))
    }

    /// Create paths with a custom root directory (useful for testing).
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            database: root.join("engojee.db"),
            root,
        }
    }

    /// Ensure the root directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), EngojeeError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| {
                EngojeeError::Config(format!(
                    "Failed to create directory {}: {e}",
                    self.root.display()
                ))
            })?;
        }
        Ok(())
    }
}
