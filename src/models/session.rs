//! Loader nodes that keep the last loaded artifact in memory.
//!
//! Graph executors call the same node instance once per prompt; reusing the
//! payload avoids re-reading a multi-hundred-megabyte LoRA when the reference
//! does not change between prompts.

use crate::error::Result;
use crate::models::payload::{ArtifactLoader, SafetensorsLoader, SafetensorsPayload};
use crate::models::reference::HubReference;
use crate::models::resolver::SourceResolver;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
struct LoadedArtifact {
    path: PathBuf,
    payload: Arc<SafetensorsPayload>,
}

/// One-entry payload cache keyed by path
#[derive(Debug, Default)]
pub struct ArtifactSlot {
    loaded: Option<LoadedArtifact>,
}

impl ArtifactSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the payload for `path`, loading it unless it is the one held
    pub fn get_or_load(
        &mut self,
        path: &Path,
        loader: &dyn ArtifactLoader,
    ) -> Result<Arc<SafetensorsPayload>> {
        if let Some(loaded) = &self.loaded {
            if loaded.path == path {
                tracing::debug!("Reusing loaded artifact {}", path.display());
                return Ok(Arc::clone(&loaded.payload));
            }
        }

        // drop the old payload before reading the new one
        self.loaded = None;

        let payload = Arc::new(loader.load(path)?);
        self.loaded = Some(LoadedArtifact {
            path: path.to_path_buf(),
            payload: Arc::clone(&payload),
        });

        Ok(payload)
    }

    /// Path of the payload currently held
    #[must_use]
    pub fn loaded_path(&self) -> Option<&Path> {
        self.loaded.as_ref().map(|loaded| loaded.path.as_path())
    }

    pub fn clear(&mut self) {
        self.loaded = None;
    }
}

/// A LoRA ready for the host to merge into its model and text encoder
#[derive(Debug, Clone)]
pub struct LoraPatch {
    pub path: PathBuf,
    pub payload: Arc<SafetensorsPayload>,
    pub strength_model: f64,
    pub strength_clip: f64,
}

/// Both strengths at zero leave the model untouched
#[allow(clippy::float_cmp)]
fn is_noop(strength_model: f64, strength_clip: f64) -> bool {
    strength_model == 0.0 && strength_clip == 0.0
}

/// `LoraLoaderFromURL`: LoRA from a Hugging Face, CivitAI or plain URL
pub struct LoraLoaderFromUrl {
    resolver: Arc<SourceResolver>,
    loader: Box<dyn ArtifactLoader>,
    slot: ArtifactSlot,
}

impl LoraLoaderFromUrl {
    #[must_use]
    pub fn new(resolver: Arc<SourceResolver>) -> Self {
        Self::with_loader(resolver, Box::new(SafetensorsLoader))
    }

    #[must_use]
    pub fn with_loader(resolver: Arc<SourceResolver>, loader: Box<dyn ArtifactLoader>) -> Self {
        Self {
            resolver,
            loader,
            slot: ArtifactSlot::new(),
        }
    }

    /// Resolve and load the LoRA at `url`
    ///
    /// # Returns
    /// `None` when both strengths are zero; nothing is downloaded or read.
    pub fn load_lora(
        &mut self,
        url: &str,
        strength_model: f64,
        strength_clip: f64,
    ) -> Result<Option<LoraPatch>> {
        if is_noop(strength_model, strength_clip) {
            return Ok(None);
        }

        let path = self.resolver.resolve(url)?;
        let payload = self.slot.get_or_load(&path, self.loader.as_ref())?;

        Ok(Some(LoraPatch {
            path,
            payload,
            strength_model,
            strength_clip,
        }))
    }

    #[must_use]
    pub const fn slot(&self) -> &ArtifactSlot {
        &self.slot
    }
}

/// `HFHubLoraLoader`: LoRA from explicit hub repo/subfolder/filename fields
pub struct HubLoraLoader {
    resolver: Arc<SourceResolver>,
    loader: Box<dyn ArtifactLoader>,
    slot: ArtifactSlot,
}

impl HubLoraLoader {
    #[must_use]
    pub fn new(resolver: Arc<SourceResolver>) -> Self {
        Self::with_loader(resolver, Box::new(SafetensorsLoader))
    }

    #[must_use]
    pub fn with_loader(resolver: Arc<SourceResolver>, loader: Box<dyn ArtifactLoader>) -> Self {
        Self {
            resolver,
            loader,
            slot: ArtifactSlot::new(),
        }
    }

    pub fn load_lora(
        &mut self,
        repo_id: &str,
        subfolder: Option<&str>,
        filename: &str,
        strength_model: f64,
        strength_clip: f64,
    ) -> Result<Option<LoraPatch>> {
        if is_noop(strength_model, strength_clip) {
            return Ok(None);
        }

        let reference = HubReference::new(repo_id, subfolder, filename)?;
        let path = self.resolver.resolve_hub(&reference)?;
        let payload = self.slot.get_or_load(&path, self.loader.as_ref())?;

        Ok(Some(LoraPatch {
            path,
            payload,
            strength_model,
            strength_clip,
        }))
    }

    #[must_use]
    pub const fn slot(&self) -> &ArtifactSlot {
        &self.slot
    }
}

/// `HFHubEmbeddingLoader`: places a textual-inversion embedding where the
/// host looks for embeddings. The text encoder passes through unchanged.
#[derive(Debug)]
pub struct HubEmbeddingLoader {
    resolver: Arc<SourceResolver>,
}

impl HubEmbeddingLoader {
    #[must_use]
    pub const fn new(resolver: Arc<SourceResolver>) -> Self {
        Self { resolver }
    }

    pub fn download_embedding(
        &self,
        repo_id: &str,
        subfolder: Option<&str>,
        filename: &str,
    ) -> Result<PathBuf> {
        let reference = HubReference::new(repo_id, subfolder, filename)?;
        let embeddings_dir = self.resolver.layout().embeddings_dir();
        self.resolver.resolve_hub_in(&reference, &embeddings_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NodeError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        loads: Arc<AtomicUsize>,
    }

    impl ArtifactLoader for CountingLoader {
        fn load(&self, path: &Path) -> Result<SafetensorsPayload> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if path.ends_with("missing.safetensors") {
                return Err(NodeError::InvalidArtifact("missing".to_string()));
            }
            SafetensorsPayload::from_bytes(crate::models::payload::encode_safetensors(&[]))
        }
    }

    #[test]
    fn test_slot_reuses_same_path() {
        let loads = Arc::new(AtomicUsize::new(0));
        let loader = CountingLoader {
            loads: Arc::clone(&loads),
        };
        let mut slot = ArtifactSlot::new();

        let a = slot.get_or_load(Path::new("/c/a.safetensors"), &loader).unwrap();
        let b = slot.get_or_load(Path::new("/c/a.safetensors"), &loader).unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_slot_evicts_on_new_path() {
        let loads = Arc::new(AtomicUsize::new(0));
        let loader = CountingLoader {
            loads: Arc::clone(&loads),
        };
        let mut slot = ArtifactSlot::new();

        slot.get_or_load(Path::new("/c/a.safetensors"), &loader).unwrap();
        slot.get_or_load(Path::new("/c/b.safetensors"), &loader).unwrap();
        assert_eq!(slot.loaded_path(), Some(Path::new("/c/b.safetensors")));

        slot.get_or_load(Path::new("/c/a.safetensors"), &loader).unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_slot_empty_after_failed_load() {
        let loader = CountingLoader {
            loads: Arc::new(AtomicUsize::new(0)),
        };
        let mut slot = ArtifactSlot::new();

        slot.get_or_load(Path::new("/c/a.safetensors"), &loader).unwrap();
        assert!(slot
            .get_or_load(Path::new("/c/missing.safetensors"), &loader)
            .is_err());
        assert!(slot.loaded_path().is_none());
    }

    #[test]
    fn test_is_noop() {
        assert!(is_noop(0.0, 0.0));
        assert!(!is_noop(0.0, 1.0));
        assert!(!is_noop(-0.5, 0.0));
    }
}
