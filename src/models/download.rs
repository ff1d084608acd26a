use crate::error::{Result, ResolveError};
use crate::models::reference::HubReference;
use hf_hub::{api::sync::ApiBuilder, Repo, RepoType};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use url::Url;

/// Plain HTTP download of a single file
pub trait Transport: Send + Sync {
    /// Fetch `url` and write the whole response body to `dest`
    ///
    /// # Returns
    /// Number of bytes written
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Hub download into the hub client's own cache layout
pub trait HubClient: Send + Sync {
    /// Fetch the referenced file into `cache_dir`, returning its local path
    fn fetch(&self, reference: &HubReference, cache_dir: &Path) -> Result<PathBuf>;
}

/// Blocking `reqwest` transport with an optional progress bar
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    show_progress: bool,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("client", &"Client { ... }")
            .field("show_progress", &self.show_progress)
            .finish()
    }
}

impl HttpTransport {
    /// Create new transport. Requests follow redirects and never time out.
    pub fn new(show_progress: bool) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None)
            .build()
            .map_err(|e| ResolveError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            show_progress,
        })
    }

    fn progress_bar(total: Option<u64>) -> ProgressBar {
        match total {
            Some(len) => {
                let style = ProgressStyle::with_template(
                    "{spinner} [{elapsed_precise}] {wide_bar} {bytes}/{total_bytes} ({bytes_per_sec})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar());
                ProgressBar::new(len).with_style(style)
            }
            None => ProgressBar::new_spinner(),
        }
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ResolveError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ResolveError::Download {
                status: status.as_u16(),
                url: redact_token(url),
            }
            .into());
        }

        let total = response.content_length();
        let mut file = File::create(dest)?;

        // A failure mid-stream leaves the partial file in place
        let written = if self.show_progress {
            let bar = Self::progress_bar(total);
            let written = response
                .copy_to(&mut bar.wrap_write(&mut file))
                .map_err(|e| ResolveError::Network(e.without_url().to_string()))?;
            bar.finish_and_clear();
            written
        } else {
            response
                .copy_to(&mut file)
                .map_err(|e| ResolveError::Network(e.without_url().to_string()))?
        };

        Ok(written)
    }
}

/// `hf-hub` backed client; files land in the hub's snapshot layout
#[derive(Debug, Clone)]
pub struct HfHubClient {
    show_progress: bool,
}

impl HfHubClient {
    #[must_use]
    pub const fn new(show_progress: bool) -> Self {
        Self { show_progress }
    }
}

impl HubClient for HfHubClient {
    fn fetch(&self, reference: &HubReference, cache_dir: &Path) -> Result<PathBuf> {
        let api = ApiBuilder::new()
            .with_cache_dir(cache_dir.to_path_buf())
            .with_progress(self.show_progress)
            .build()
            .map_err(|e| ResolveError::Hub(format!("Failed to initialize HuggingFace API: {e}")))?;

        let repo = api.repo(Repo::with_revision(
            reference.repo_id.clone(),
            RepoType::Model,
            reference.revision().to_string(),
        ));

        let path_in_repo = reference.path_in_repo();
        let path = repo.get(&path_in_repo).map_err(|e| {
            ResolveError::Hub(format!(
                "Failed to download {path_in_repo} from {}: {e}",
                reference.repo_id
            ))
        })?;

        Ok(path)
    }
}

/// Hide the value of a `token` query parameter before a URL is logged
#[must_use]
pub fn redact_token(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };

    if !parsed.query_pairs().any(|(key, _)| key == "token") {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "token" {
                "***".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}

/// Format bytes as human-readable string
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
