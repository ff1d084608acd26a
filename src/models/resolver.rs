use crate::config::Config;
use crate::error::Result;
use crate::models::cache::CacheLayout;
use crate::models::download::{format_bytes, redact_token, HfHubClient, HttpTransport, HubClient, Transport};
use crate::models::reference::{ArtifactReference, HubReference};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Turns artifact references into local files, downloading on first use.
///
/// Cache entries are never re-validated: whatever file sits at the cache path
/// is returned as-is, including one left behind by an interrupted download.
pub struct SourceResolver {
    layout: CacheLayout,
    api_key_env: String,
    transport: Box<dyn Transport>,
    hub: Box<dyn HubClient>,
}

impl std::fmt::Debug for SourceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceResolver")
            .field("layout", &self.layout)
            .field("api_key_env", &self.api_key_env)
            .finish_non_exhaustive()
    }
}

impl SourceResolver {
    pub fn new(
        layout: CacheLayout,
        api_key_env: impl Into<String>,
        transport: Box<dyn Transport>,
        hub: Box<dyn HubClient>,
    ) -> Self {
        Self {
            layout,
            api_key_env: api_key_env.into(),
            transport,
            hub,
        }
    }

    /// Create resolver with the real HTTP and hub clients
    pub fn from_config(config: &Config) -> Result<Self> {
        let layout = CacheLayout::from_config(&config.cache)?;
        let show_progress = config.download.show_progress;

        Ok(Self::new(
            layout,
            config.marketplace.api_key_env.clone(),
            Box::new(HttpTransport::new(show_progress)?),
            Box::new(HfHubClient::new(show_progress)),
        ))
    }

    #[must_use]
    pub const fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    /// Resolve a URL to a local file path
    pub fn resolve(&self, reference: &str) -> Result<PathBuf> {
        let reference = ArtifactReference::parse(reference)?;
        tracing::debug!("Resolving {} reference", reference.provider());
        self.resolve_reference(&reference)
    }

    /// Resolve an already-classified reference
    pub fn resolve_reference(&self, reference: &ArtifactReference) -> Result<PathBuf> {
        match reference {
            ArtifactReference::Hub(hub) => self.resolve_hub(hub),
            ArtifactReference::Marketplace(marketplace) => {
                let dest = self.layout.marketplace_path(&marketplace.cache_filename());
                // the token is appended after hashing so the cache key ignores it
                let url = match self.api_key() {
                    Some(key) => append_query(&marketplace.url, "token", &key),
                    None => marketplace.url.clone(),
                };
                self.fetch_if_missing(&url, dest)
            }
            ArtifactReference::Generic(generic) => {
                let dest = self.layout.general_path(&generic.cache_filename());
                self.fetch_if_missing(&generic.url, dest)
            }
        }
    }

    /// Fetch a hub file into the shared cache root
    pub fn resolve_hub(&self, reference: &HubReference) -> Result<PathBuf> {
        let cache_dir = self.layout.ensure_root()?;
        self.fetch_hub(reference, cache_dir)
    }

    /// Fetch a hub file into a caller-chosen directory
    pub fn resolve_hub_in(&self, reference: &HubReference, cache_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(cache_dir)?;
        self.fetch_hub(reference, cache_dir)
    }

    /// Where a marketplace or generic reference is cached. Hub files live in
    /// the hub client's own layout, so they have no predictable path.
    #[must_use]
    pub fn cache_path_for(&self, reference: &ArtifactReference) -> Option<PathBuf> {
        match reference {
            ArtifactReference::Hub(_) => None,
            ArtifactReference::Marketplace(marketplace) => {
                Some(self.layout.marketplace_path(&marketplace.cache_filename()))
            }
            ArtifactReference::Generic(generic) => {
                Some(self.layout.general_path(&generic.cache_filename()))
            }
        }
    }

    fn fetch_hub(&self, reference: &HubReference, cache_dir: &Path) -> Result<PathBuf> {
        tracing::info!(
            "Fetching {} from {}@{}",
            reference.path_in_repo(),
            reference.repo_id,
            reference.revision()
        );
        self.hub.fetch(reference, cache_dir)
    }

    fn fetch_if_missing(&self, url: &str, dest: PathBuf) -> Result<PathBuf> {
        if dest.exists() {
            tracing::debug!("Cache hit: {}", dest.display());
            return Ok(dest);
        }

        self.layout.ensure_root()?;
        tracing::info!("Downloading {} to {}", redact_token(url), dest.display());

        let written = self.transport.fetch(url, &dest)?;
        tracing::info!("Downloaded {} ({})", dest.display(), format_bytes(written));

        Ok(dest)
    }

    fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

/// Add `key=value` to the query, keeping any fragment after it
fn append_query(url: &str, key: &str, value: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.query_pairs_mut().append_pair(key, value);
            parsed.to_string()
        }
        Err(_) => {
            let separator = if url.contains('?') { '&' } else { '?' };
            format!("{url}{separator}{key}={value}")
        }
    }
}
