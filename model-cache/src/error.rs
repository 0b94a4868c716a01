use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelCacheError {
    #[error("Registry root not found: {0}")]
    RegistryNotFound(PathBuf),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Model path escapes registry root: {0}")]
    OutsideRegistry(String),

    #[error("Invalid model identifier: {0}")]
    InvalidModelId(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelCacheError {
    /// True for every variant a caller should report as "model not found"
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ModelNotFound(_) | Self::OutsideRegistry(_) | Self::InvalidModelId(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ModelCacheError>;
