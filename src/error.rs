use thiserror::Error;

/// Main error type for glif-nodes
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid artifact: {0}\n\nTroubleshooting:\n- Only safetensors files can be loaded\n- A partial download is reused as-is; delete the cached file and retry")]
    InvalidArtifact(String),

    #[error("Config error: {0}\n\nTroubleshooting:\n- Check config file: ~/.config/glif-nodes/config.toml\n- Run with RUST_LOG=debug for more details")]
    Config(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors raised while turning a reference into a local file
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Failed to download file. Status code: {status}\n\nTroubleshooting:\n- Gated CivitAI models need CIVITAI_API_KEY to be set\n- Check that the URL opens in a browser")]
    Download { status: u16, url: String },

    #[error("Network error: {0}\n\nTroubleshooting:\n- Check internet connection\n- Verify firewall settings")]
    Network(String),

    #[error("Hugging Face Hub error: {0}\n\nTroubleshooting:\n- Check the repo id and filename\n- Gated repos need a token: huggingface-cli login")]
    Hub(String),
}

impl ResolveError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidReference(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, NodeError>;
