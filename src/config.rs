//! Editor and persistence configuration.
//!
//! Loaded from `$XDG_CONFIG_HOME/deckedit/config.json` (or `~/.config/...`).
//! Every field has a default, so a partial file is fine and a missing or
//! malformed file yields [`Config::default`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::history::DEFAULT_HISTORY_LIMIT;

/// Debounce window for coalescing saves
pub const DEFAULT_DEBOUNCE_MS: u64 = 2000;

/// Visual offset applied to duplicated elements, in document units
pub const DEFAULT_DUPLICATE_OFFSET: f64 = 20.0;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub editor: EditorConfig,
    pub persist: PersistConfig,
}

/// Configuration for the transition engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of undo steps
    pub history_limit: usize,
    /// Offset applied on both axes when duplicating an element
    pub duplicate_offset: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            duplicate_offset: DEFAULT_DUPLICATE_OFFSET,
        }
    }
}

/// Configuration for the persistence controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    /// Quiet period before a scheduled save fires
    pub debounce_ms: u64,
    /// Directory for file-backed documents; defaults to the XDG data dir
    pub storage_dir: Option<PathBuf>,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            storage_dir: None,
        }
    }
}

impl PersistConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Configured storage directory, or the default data directory
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(default_storage_dir)
    }
}

impl Config {
    /// Load from the default config path, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                Self::default()
            }
        }
    }

    /// Load from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config in {:?}", path))?;
        Ok(config)
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".config")
            });
        config_dir.join("deckedit").join("config.json")
    }
}

/// Get the default directory for file-backed documents
pub fn default_storage_dir() -> PathBuf {
    // Use XDG data directory if available, otherwise fallback to ~/.local/share
    let data_dir = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local/share")
        });
    data_dir.join("deckedit").join("documents")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"persist": {"debounce_ms": 500}}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.persist.debounce(), Duration::from_millis(500));
        assert_eq!(config.editor, EditorConfig::default());
        assert_eq!(config.editor.history_limit, 30);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn explicit_storage_dir_wins() {
        let config = PersistConfig {
            storage_dir: Some(PathBuf::from("/tmp/decks")),
            ..PersistConfig::default()
        };
        assert_eq!(config.storage_dir(), PathBuf::from("/tmp/decks"));
        assert!(PersistConfig::default().storage_dir().ends_with("deckedit/documents"));
    }
}
