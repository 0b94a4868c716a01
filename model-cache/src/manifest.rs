use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// File name of the model artifact inside a registry leaf directory
pub const MODEL_FILE: &str = "model.onnx";

/// File name of the optional metadata sidecar
pub const METADATA_FILE: &str = "model.json";

/// State of the `model.json` sidecar for a registry entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetadataStatus {
    Present { value: serde_json::Value },
    Missing,
    Invalid { reason: String },
}

/// One `{dataset_version}/{arch_name}/{model_name}` leaf of the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Path of `model.onnx` relative to the registry root, if present
    pub onnx: Option<String>,
    pub metadata: MetadataStatus,
}

impl ManifestEntry {
    /// Inspect a leaf directory; never fails, absence is reported in the entry
    pub fn from_dir(root: &Path, model_dir: &Path) -> Self {
        let onnx_file = model_dir.join(MODEL_FILE);
        let onnx = if onnx_file.is_file() {
            let relative = onnx_file.strip_prefix(root).unwrap_or(&onnx_file);
            Some(relative.to_string_lossy().replace('\\', "/"))
        } else {
            None
        };

        Self {
            onnx,
            metadata: read_metadata(&model_dir.join(METADATA_FILE)),
        }
    }

    pub fn has_model(&self) -> bool {
        self.onnx.is_some()
    }
}

fn read_metadata(path: &Path) -> MetadataStatus {
    if !path.is_file() {
        return MetadataStatus::Missing;
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(value) => MetadataStatus::Present { value },
            Err(e) => {
                log::warn!("Invalid JSON in {:?}: {}", path, e);
                MetadataStatus::Invalid { reason: e.to_string() }
            }
        },
        Err(e) => MetadataStatus::Invalid { reason: e.to_string() },
    }
}

/// model_name -> entry
pub type ArchListing = BTreeMap<String, ManifestEntry>;

/// arch_name -> models
pub type DatasetListing = BTreeMap<String, ArchListing>;

/// dataset_version -> architectures
pub type RegistryListing = BTreeMap<String, DatasetListing>;

/// Fully-qualified registry entry returned by model lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub dataset_version: String,
    pub arch_name: String,
    pub model_name: String,
    pub entry: ManifestEntry,
}
