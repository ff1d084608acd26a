use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub marketplace: MarketplaceConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct CacheConfig {
    /// Overrides cache root discovery from the working directory
    pub root: Option<PathBuf>,
    #[serde(default = "default_marketplace_dir")]
    pub marketplace_dir: String,
    #[serde(default = "default_general_dir")]
    pub general_dir: String,
    /// Where hub embeddings are placed (default: `<cache root>/embeddings`)
    pub embeddings_dir: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct MarketplaceConfig {
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct DownloadConfig {
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

// Default value functions
fn default_marketplace_dir() -> String {
    "marketplace".to_string()
}
fn default_general_dir() -> String {
    "general".to_string()
}
fn default_api_key_env() -> String {
    "CIVITAI_API_KEY".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: None,
            marketplace_dir: default_marketplace_dir(),
            general_dir: default_general_dir(),
            embeddings_dir: None,
        }
    }
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            show_progress: default_true(),
        }
    }
}
