use crate::error::ResolveError;
use crate::models::cache::hashed_filename;
use url::Url;

pub const SAFETENSORS_EXTENSION: &str = "safetensors";
pub const HUB_DOMAIN: &str = "huggingface.co";
pub const MARKETPLACE_DOMAIN: &str = "civitai.com";

const HUB_DOWNLOAD_MARKER: &str = "?download=true";
const MARKETPLACE_FORMAT_MARKER: &str = "SafeTensor";
const MARKETPLACE_VERSION_PARAM: &str = "modelVersionId";
const DEFAULT_REVISION: &str = "main";

/// A file inside a Hugging Face Hub model repo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubReference {
    pub repo_id: String,
    pub revision: Option<String>,
    pub subfolder: Option<String>,
    pub filename: String,
}

impl HubReference {
    /// Build a reference from the loose fields a loader node receives.
    ///
    /// Fields are trimmed; a blank subfolder means the repo root.
    pub fn new(repo_id: &str, subfolder: Option<&str>, filename: &str) -> Result<Self, ResolveError> {
        let repo_id = repo_id.trim();
        let filename = filename.trim();

        if repo_id.is_empty() {
            return Err(ResolveError::invalid("Hub repo id is empty"));
        }
        if filename.is_empty() {
            return Err(ResolveError::invalid("Hub filename is empty"));
        }

        Ok(Self {
            repo_id: repo_id.to_string(),
            revision: None,
            subfolder: subfolder
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            filename: filename.to_string(),
        })
    }

    /// Revision to fetch, `main` unless the URL named one
    #[must_use]
    pub fn revision(&self) -> &str {
        self.revision.as_deref().unwrap_or(DEFAULT_REVISION)
    }

    /// Path of the file relative to the repo root
    #[must_use]
    pub fn path_in_repo(&self) -> String {
        match &self.subfolder {
            Some(subfolder) => format!("{subfolder}/{}", self.filename),
            None => self.filename.clone(),
        }
    }
}

/// A CivitAI download, always in canonical download-URL form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceReference {
    pub url: String,
}

impl MarketplaceReference {
    /// Name of the cache file; derived from the URL without any API token
    #[must_use]
    pub fn cache_filename(&self) -> String {
        hashed_filename(&self.url, SAFETENSORS_EXTENSION)
    }
}

/// Any other host serving a safetensors file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericReference {
    pub url: String,
}

impl GenericReference {
    #[must_use]
    pub fn cache_filename(&self) -> String {
        hashed_filename(&self.url, SAFETENSORS_EXTENSION)
    }
}

/// A user-supplied artifact location, classified by hosting convention
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactReference {
    Hub(HubReference),
    Marketplace(MarketplaceReference),
    Generic(GenericReference),
}

impl ArtifactReference {
    /// Classify and canonicalize a URL.
    ///
    /// Every format check happens here, so an `Err` guarantees no network
    /// access was attempted.
    pub fn parse(input: &str) -> Result<Self, ResolveError> {
        let input = input.trim();

        if input.is_empty() {
            return Err(ResolveError::invalid("URL is empty"));
        }
        if !input.starts_with("http") {
            return Err(ResolveError::invalid(format!("Invalid URL: {input}")));
        }

        let parsed = parse_url(input)?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ResolveError::invalid(format!("URL has no host: {input}")))?;

        if host_matches(host, HUB_DOMAIN) {
            parse_hub(input).map(Self::Hub)
        } else if host_matches(host, MARKETPLACE_DOMAIN) {
            parse_marketplace(input, &parsed).map(Self::Marketplace)
        } else {
            parse_generic(input, &parsed).map(Self::Generic)
        }
    }

    /// Short provider name for logging
    #[must_use]
    pub fn provider(&self) -> &'static str {
        match self {
            Self::Hub(_) => "huggingface",
            Self::Marketplace(_) => "civitai",
            Self::Generic(_) => "general",
        }
    }
}

fn parse_url(input: &str) -> Result<Url, ResolveError> {
    Url::parse(input).map_err(|e| ResolveError::invalid(format!("Invalid URL {input}: {e}")))
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn require_safetensors_path(path: &str) -> Result<(), ResolveError> {
    let suffix = format!(".{SAFETENSORS_EXTENSION}");
    if path.to_lowercase().ends_with(&suffix) {
        Ok(())
    } else {
        Err(ResolveError::invalid(
            "Only safetensors files are supported for security reasons.",
        ))
    }
}

// https://huggingface.co/<owner>/<repo>/resolve/<revision>/[<subfolder>/...]<file>.safetensors
fn parse_hub(input: &str) -> Result<HubReference, ResolveError> {
    let mut url = input
        .strip_suffix(HUB_DOWNLOAD_MARKER)
        .unwrap_or(input)
        .to_string();

    // users often copy the file viewer link
    if url.contains("/blob/") {
        url = url.replace("/blob/", "/resolve/");
    }

    let parsed = parse_url(&url)?;
    require_safetensors_path(parsed.path())?;

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    if segments.len() < 3 {
        return Err(ResolveError::invalid(format!(
            "Expected <owner>/<repo>/.../<file>.safetensors in {url}"
        )));
    }

    let last = segments.len() - 1;
    let revision = (segments.len() >= 5 && segments[2] == "resolve").then(|| segments[3].to_string());
    let subfolder = (segments.len() > 5).then(|| segments[4..last].join("/"));

    Ok(HubReference {
        repo_id: format!("{}/{}", segments[0], segments[1]),
        revision,
        subfolder,
        filename: segments[last].to_string(),
    })
}

// good: https://civitai.com/api/download/models/<version>?type=Model&format=SafeTensor
// rewritten: https://civitai.com/models/<model>?modelVersionId=<version>
fn parse_marketplace(input: &str, parsed: &Url) -> Result<MarketplaceReference, ResolveError> {
    let version_id = parsed
        .query_pairs()
        .find(|(key, _)| key == MARKETPLACE_VERSION_PARAM)
        .map(|(_, value)| value.trim().to_string());

    let url = match version_id {
        Some(id) if id.is_empty() => {
            return Err(ResolveError::invalid(format!(
                "Empty {MARKETPLACE_VERSION_PARAM} in {input}"
            )))
        }
        Some(id) => canonical_marketplace_url(&id),
        None => input.to_string(),
    };

    if !url.contains(MARKETPLACE_FORMAT_MARKER) {
        return Err(ResolveError::invalid(
            "Only safetensors files are supported for security reasons.",
        ));
    }

    Ok(MarketplaceReference { url })
}

/// Download URL for a CivitAI model version
#[must_use]
pub fn canonical_marketplace_url(model_version_id: &str) -> String {
    format!(
        "https://{MARKETPLACE_DOMAIN}/api/download/models/{model_version_id}?type=Model&format={MARKETPLACE_FORMAT_MARKER}"
    )
}

fn parse_generic(input: &str, parsed: &Url) -> Result<GenericReference, ResolveError> {
    require_safetensors_path(parsed.path())?;
    Ok(GenericReference {
        url: input.to_string(),
    })
}
