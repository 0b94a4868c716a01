//! Directory-backed model registry
//!
//! Layout: `{root}/{dataset_version}/{arch_name}/{model_name}/model.onnx`
//! with an optional `model.json` next to each artifact. Every lookup is
//! canonicalized and must stay under the canonical registry root.

use crate::error::{ModelCacheError, Result};
use crate::manifest::{
    ArchListing, DatasetListing, ManifestEntry, ModelInfo, RegistryListing, MODEL_FILE,
};
use std::path::{Component, Path, PathBuf};

/// A model identifier resolved to a canonical file inside the registry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelPath {
    /// Identifier as supplied by the caller
    pub id: String,
    /// Canonical absolute path to the `.onnx` file
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    root: PathBuf,
}

impl ModelRegistry {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Root as configured (not canonicalized)
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical registry root; fails if the directory does not exist
    pub fn canonical_root(&self) -> Result<PathBuf> {
        match self.root.canonicalize() {
            Ok(root) if root.is_dir() => Ok(root),
            _ => Err(ModelCacheError::RegistryNotFound(self.root.clone())),
        }
    }

    /// Resolve a relative model identifier to a canonical model file.
    ///
    /// A directory identifier resolves to the `model.onnx` inside it, and
    /// only `.onnx` files are accepted.
    /// Identifiers that are empty, absolute, contain `..`, or resolve
    /// (through symlinks) outside the root are rejected.
    pub fn resolve(&self, model_id: &str) -> Result<ModelPath> {
        validate_relative(model_id)?;
        let root = self.canonical_root()?;

        let mut candidate = root.join(model_id);
        if candidate.is_dir() {
            candidate.push(MODEL_FILE);
        }

        let canonical = candidate.canonicalize().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ModelCacheError::ModelNotFound(model_id.to_string()),
            _ => ModelCacheError::Io(e),
        })?;

        if !canonical.starts_with(&root) {
            log::warn!(
                "Rejected model id '{}': resolves to {:?} outside {:?}",
                model_id,
                canonical,
                root
            );
            return Err(ModelCacheError::OutsideRegistry(model_id.to_string()));
        }

        if !canonical.is_file() || !has_onnx_extension(&canonical) {
            return Err(ModelCacheError::ModelNotFound(model_id.to_string()));
        }

        log::debug!("Resolved model '{}' -> {:?}", model_id, canonical);

        Ok(ModelPath {
            id: model_id.to_string(),
            path: canonical,
        })
    }

    /// Walk the three directory levels under the root
    pub fn list(&self) -> Result<RegistryListing> {
        let root = self.canonical_root()?;
        let mut listing = RegistryListing::new();

        for (dataset_version, dataset_dir) in subdirectories(&root)? {
            let mut dataset = DatasetListing::new();

            for (arch_name, arch_dir) in subdirectories(&dataset_dir)? {
                let mut arch = ArchListing::new();

                for (model_name, model_dir) in subdirectories(&arch_dir)? {
                    arch.insert(model_name, ManifestEntry::from_dir(&root, &model_dir));
                }

                dataset.insert(arch_name, arch);
            }

            listing.insert(dataset_version, dataset);
        }

        log::debug!("Registry listing: {} dataset versions", listing.len());
        Ok(listing)
    }

    /// Look up one registry leaf
    pub fn model_info(&self, dataset_version: &str, arch_name: &str, model_name: &str) -> Result<ModelInfo> {
        let root = self.canonical_root()?;
        let id = format!("{}/{}/{}", dataset_version, arch_name, model_name);

        for segment in [dataset_version, arch_name, model_name] {
            if !is_single_segment(segment) {
                return Err(ModelCacheError::InvalidModelId(id));
            }
        }

        let model_dir = root.join(dataset_version).join(arch_name).join(model_name);
        let canonical = model_dir
            .canonicalize()
            .map_err(|_| ModelCacheError::ModelNotFound(id.clone()))?;

        if !canonical.starts_with(&root) {
            return Err(ModelCacheError::OutsideRegistry(id));
        }
        if !canonical.is_dir() {
            return Err(ModelCacheError::ModelNotFound(id));
        }

        Ok(ModelInfo {
            dataset_version: dataset_version.to_string(),
            arch_name: arch_name.to_string(),
            model_name: model_name.to_string(),
            entry: ManifestEntry::from_dir(&root, &canonical),
        })
    }
}

fn has_onnx_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("onnx"))
        .unwrap_or(false)
}

fn validate_relative(model_id: &str) -> Result<()> {
    if model_id.trim().is_empty() {
        return Err(ModelCacheError::InvalidModelId(model_id.to_string()));
    }

    let path = Path::new(model_id);
    let all_normal = path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

    if !all_normal {
        return Err(ModelCacheError::InvalidModelId(model_id.to_string()));
    }
    Ok(())
}

fn is_single_segment(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Sorted `(name, path)` pairs of the directories directly under `dir`
fn subdirectories(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            dirs.push((name.to_string(), path));
        }
    }

    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MetadataStatus;
    use tempfile::TempDir;

    fn registry_with_model() -> (TempDir, ModelRegistry) {
        let root = TempDir::new().unwrap();
        let leaf = root.path().join("v1").join("mobilenetv2").join("base");
        std::fs::create_dir_all(&leaf).unwrap();
        std::fs::write(leaf.join(MODEL_FILE), b"onnx").unwrap();
        let registry = ModelRegistry::new(root.path());
        (root, registry)
    }

    #[test]
    fn test_resolve_file_and_directory() {
        let (_root, registry) = registry_with_model();

        let by_file = registry.resolve("v1/mobilenetv2/base/model.onnx").unwrap();
        let by_dir = registry.resolve("v1/mobilenetv2/base").unwrap();

        assert_eq!(by_file.path, by_dir.path);
        assert!(by_file.path.is_absolute());
        assert_eq!(by_dir.id, "v1/mobilenetv2/base");
    }

    #[test]
    fn test_resolve_missing_model() {
        let (_root, registry) = registry_with_model();
        let err = registry.resolve("v1/mobilenetv2/large/model.onnx").unwrap_err();
        assert!(matches!(err, ModelCacheError::ModelNotFound(_)));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_resolve_rejects_non_onnx_files() {
        let (root, registry) = registry_with_model();
        let leaf = root.path().join("v1").join("mobilenetv2").join("base");
        std::fs::write(leaf.join("model.json"), br#"{"epochs": 3}"#).unwrap();

        let err = registry.resolve("v1/mobilenetv2/base/model.json").unwrap_err();
        assert!(matches!(err, ModelCacheError::ModelNotFound(_)));

        // extension is checked on the link target
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(leaf.join("model.json"), leaf.join("alias.onnx")).unwrap();
            let err = registry.resolve("v1/mobilenetv2/base/alias.onnx").unwrap_err();
            assert!(matches!(err, ModelCacheError::ModelNotFound(_)));
        }
    }

    #[test]
    fn test_resolve_rejects_traversal_and_absolute() {
        let (_root, registry) = registry_with_model();

        for id in ["../secret.onnx", "v1/../../etc/passwd", "/etc/passwd", "", "  "] {
            let err = registry.resolve(id).unwrap_err();
            assert!(
                matches!(err, ModelCacheError::InvalidModelId(_)),
                "expected InvalidModelId for {:?}, got {:?}",
                id,
                err
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_symlink_escape() {
        let (root, registry) = registry_with_model();
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("model.onnx"), b"onnx").unwrap();
        std::os::unix::fs::symlink(outside.path(), root.path().join("v1").join("escape")).unwrap();

        let err = registry.resolve("v1/escape/model.onnx").unwrap_err();
        assert!(matches!(err, ModelCacheError::OutsideRegistry(_)));
    }

    #[test]
    fn test_missing_root() {
        let registry = ModelRegistry::new("/definitely/not/a/registry");
        assert!(matches!(registry.list(), Err(ModelCacheError::RegistryNotFound(_))));
        assert!(matches!(
            registry.resolve("v1/a/b"),
            Err(ModelCacheError::RegistryNotFound(_))
        ));
    }

    #[test]
    fn test_list_nested_layout() {
        let (root, registry) = registry_with_model();
        let other = root.path().join("v2").join("resnet18").join("tuned");
        std::fs::create_dir_all(&other).unwrap();
        std::fs::write(other.join("model.json"), br#"{"epochs": 3}"#).unwrap();
        std::fs::write(root.path().join("README.txt"), b"not a dataset").unwrap();

        let listing = registry.list().unwrap();

        assert_eq!(listing.keys().collect::<Vec<_>>(), vec!["v1", "v2"]);
        let base = &listing["v1"]["mobilenetv2"]["base"];
        assert_eq!(base.onnx.as_deref(), Some("v1/mobilenetv2/base/model.onnx"));
        assert_eq!(base.metadata, MetadataStatus::Missing);

        let tuned = &listing["v2"]["resnet18"]["tuned"];
        assert!(tuned.onnx.is_none());
        assert!(matches!(tuned.metadata, MetadataStatus::Present { .. }));
    }

    #[test]
    fn test_model_info() {
        let (_root, registry) = registry_with_model();

        let info = registry.model_info("v1", "mobilenetv2", "base").unwrap();
        assert_eq!(info.model_name, "base");
        assert!(info.entry.has_model());

        assert!(matches!(
            registry.model_info("v1", "mobilenetv2", "missing"),
            Err(ModelCacheError::ModelNotFound(_))
        ));
        assert!(matches!(
            registry.model_info("..", "mobilenetv2", "base"),
            Err(ModelCacheError::InvalidModelId(_))
        ));
    }
}
