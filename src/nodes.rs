//! Catalog of the nodes this crate provides, keyed by the class names a
//! node-graph host registers them under.

use crate::error::NodeError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    SdxlAspectRatio,
    ImageToMultipleOf,
    HfHubLoraLoader,
    LoraLoaderFromUrl,
    HfHubEmbeddingLoader,
    GlifVariable,
    FilmGrain,
    ImagePaddingAdvanced,
    FluxReduxFloatRamp,
}

impl NodeKind {
    pub const ALL: [Self; 9] = [
        Self::SdxlAspectRatio,
        Self::ImageToMultipleOf,
        Self::HfHubLoraLoader,
        Self::LoraLoaderFromUrl,
        Self::HfHubEmbeddingLoader,
        Self::GlifVariable,
        Self::FilmGrain,
        Self::ImagePaddingAdvanced,
        Self::FluxReduxFloatRamp,
    ];

    /// Registration key
    #[must_use]
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::SdxlAspectRatio => "SDXLAspectRatio",
            Self::ImageToMultipleOf => "ImageToMultipleOf",
            Self::HfHubLoraLoader => "HFHubLoraLoader",
            Self::LoraLoaderFromUrl => "LoraLoaderFromURL",
            Self::HfHubEmbeddingLoader => "HFHubEmbeddingLoader",
            Self::GlifVariable => "GlifVariable",
            Self::FilmGrain => "FilmGrain",
            Self::ImagePaddingAdvanced => "ImagePaddingAdvanced",
            Self::FluxReduxFloatRamp => "FluxReduxFloatRamp",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::SdxlAspectRatio => "Image to SDXL compatible WH",
            Self::ImageToMultipleOf => "Image to Multiple of",
            Self::HfHubLoraLoader => "Load HF Lora",
            Self::LoraLoaderFromUrl => "Load Lora from URL",
            Self::HfHubEmbeddingLoader => "Load HF Embedding",
            Self::GlifVariable => "Glif Variable",
            Self::FilmGrain => "Film Grain Effect",
            Self::ImagePaddingAdvanced => "Image Padding Advanced",
            Self::FluxReduxFloatRamp => "Flux ReduxFloat Ramp",
        }
    }

    /// Menu category, `None` when the host should use its default
    #[must_use]
    pub const fn category(self) -> Option<&'static str> {
        match self {
            Self::SdxlAspectRatio | Self::ImageToMultipleOf | Self::ImagePaddingAdvanced => {
                Some("image")
            }
            Self::HfHubLoraLoader | Self::LoraLoaderFromUrl => Some("loaders"),
            Self::HfHubEmbeddingLoader => Some("n/a"),
            Self::GlifVariable => Some("glif/variables"),
            Self::FilmGrain => Some("image/postprocessing"),
            Self::FluxReduxFloatRamp => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

impl FromStr for NodeKind {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.class_name() == s)
            .ok_or_else(|| NodeError::InvalidParameter(format!("Unknown node class: {s}")))
    }
}
