//! Configuration module for glif-nodes
//!
//! Loads config from `$XDG_CONFIG_HOME/glif-nodes/config.toml` or `~/.config/glif-nodes/config.toml`.
//! Falls back to embedded defaults if file doesn't exist.
//! Partial configs are merged with defaults using serde's default attributes.
//!
//! # Example
//!
//! ```no_run
//! use glif_nodes::config::Config;
//!
//! let config = Config::load().expect("Failed to load config");
//! println!("API key variable: {}", config.marketplace.api_key_env);
//! ```

pub mod schema;

pub use schema::{CacheConfig, Config, DownloadConfig, MarketplaceConfig};

use crate::error::{NodeError, Result};
use std::fs;
use std::path::{Path, PathBuf};

impl Config {
    /// Load config from the user config directory, or defaults if absent
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load config from an explicit path, or defaults if the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| NodeError::Config(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Parse config from a TOML string
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Get config file path
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("glif-nodes").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.cache.root.is_none());
        assert_eq!(config.cache.marketplace_dir, "marketplace");
        assert_eq!(config.cache.general_dir, "general");
        assert_eq!(config.marketplace.api_key_env, "CIVITAI_API_KEY");
        assert!(config.download.show_progress);
    }

    #[test]
    fn test_partial_config_merges_defaults() {
        let config = Config::from_toml(
            r#"
            [cache]
            root = "/srv/models/huggingface_cache"

            [download]
            show_progress = false
            "#,
        )
        .unwrap();

        assert_eq!(
            config.cache.root.as_deref(),
            Some(Path::new("/srv/models/huggingface_cache"))
        );
        assert_eq!(config.cache.general_dir, "general");
        assert_eq!(config.marketplace.api_key_env, "CIVITAI_API_KEY");
        assert!(!config.download.show_progress);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config.cache.marketplace_dir, "marketplace");
    }

    #[test]
    fn test_load_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[cache\nroot = 1").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
