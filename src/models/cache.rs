use crate::config::CacheConfig;
use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the cache root inside the discovered models directory
pub const CACHE_DIR_NAME: &str = "huggingface_cache";

const HOST_APP_DIR: &str = "ComfyUI";
const MODELS_DIR: &str = "models";
const EMBEDDINGS_DIR: &str = "embeddings";

/// Stable cache filename for a URL: hex SHA-256 of the URL plus extension
#[must_use]
pub fn hashed_filename(url: &str, extension: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    format!("{}.{extension}", hex::encode(digest))
}

/// Locate the cache root starting from `start`.
///
/// Descends into a `ComfyUI` checkout if one sits in `start`, then walks up to
/// the nearest `models` directory. Without one the cache lives next to `start`.
#[must_use]
pub fn discover_cache_root(start: &Path) -> PathBuf {
    discover_cache_root_within(start, None)
}

/// Like [`discover_cache_root`], but the upward walk never leaves `ceiling`
#[must_use]
pub fn discover_cache_root_within(start: &Path, ceiling: Option<&Path>) -> PathBuf {
    let mut base = start.to_path_buf();
    if base.join(HOST_APP_DIR).is_dir() {
        base = base.join(HOST_APP_DIR);
    }

    let models_dir = base
        .ancestors()
        .take_while(|dir| ceiling.map_or(true, |ceiling| dir.starts_with(ceiling)))
        .map(|dir| dir.join(MODELS_DIR))
        .find(|dir| dir.is_dir());

    models_dir.unwrap_or(base).join(CACHE_DIR_NAME)
}

/// Layout of the shared artifact cache
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
    marketplace_dir: String,
    general_dir: String,
    embeddings_dir: Option<PathBuf>,
}

impl CacheLayout {
    /// Layout with default provider directories under `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let defaults = CacheConfig::default();
        Self {
            root: root.into(),
            marketplace_dir: defaults.marketplace_dir,
            general_dir: defaults.general_dir,
            embeddings_dir: None,
        }
    }

    /// Layout from config, discovering the root from the working directory
    /// when the config doesn't pin one
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let root = match &config.root {
            Some(root) => root.clone(),
            None => discover_cache_root(&std::env::current_dir()?),
        };

        Ok(Self {
            root,
            marketplace_dir: config.marketplace_dir.clone(),
            general_dir: config.general_dir.clone(),
            embeddings_dir: config.embeddings_dir.clone(),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the cache root on first use
    pub fn ensure_root(&self) -> Result<&Path> {
        if !self.root.is_dir() {
            tracing::info!("Creating cache directory {}", self.root.display());
            fs::create_dir_all(&self.root)?;
        }
        Ok(&self.root)
    }

    #[must_use]
    pub fn marketplace_path(&self, filename: &str) -> PathBuf {
        self.root.join(&self.marketplace_dir).join(filename)
    }

    #[must_use]
    pub fn general_path(&self, filename: &str) -> PathBuf {
        self.root.join(&self.general_dir).join(filename)
    }

    /// Directory hub embeddings are downloaded into
    #[must_use]
    pub fn embeddings_dir(&self) -> PathBuf {
        self.embeddings_dir
            .clone()
            .unwrap_or_else(|| self.root.join(EMBEDDINGS_DIR))
    }
}
