//! Model registry and session cache
//!
//! - [`ModelRegistry`]: resolves model identifiers to canonical `.onnx`
//!   files under a fixed root and lists the `{dataset}/{arch}/{model}` tree
//! - [`SessionCache`]: bounded LRU of loaded sessions with single-flight loading

pub mod cache;
pub mod error;
pub mod manifest;
pub mod registry;

pub use cache::{CacheStats, SessionCache};
pub use error::{ModelCacheError, Result};
pub use manifest::{
    ArchListing, DatasetListing, ManifestEntry, MetadataStatus, ModelInfo, RegistryListing,
    METADATA_FILE, MODEL_FILE,
};
pub use registry::{ModelPath, ModelRegistry};
