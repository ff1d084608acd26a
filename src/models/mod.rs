pub mod cache;
pub mod download;
pub mod payload;
pub mod reference;
pub mod resolver;
pub mod session;

pub use cache::CacheLayout;
pub use download::{HfHubClient, HttpTransport, HubClient, Transport};
pub use payload::{ArtifactLoader, SafetensorsLoader, SafetensorsPayload, TensorInfo};
pub use reference::{ArtifactReference, GenericReference, HubReference, MarketplaceReference};
pub use resolver::SourceResolver;
pub use session::{ArtifactSlot, HubEmbeddingLoader, HubLoraLoader, LoraLoaderFromUrl, LoraPatch};
