/// Pipeline errors
///
/// The three failure kinds a classification request can end in. Lower-level
/// errors from the registry and ONNX runtime are folded into these.
use onnxai_model_cache::ModelCacheError;
use onnxai_onnx_loader::OnnxError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Bytes could not be decoded as an image
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Identifier does not resolve to a model file inside the registry
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Model failed to load or run, or produced unusable output
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Failed to read labels from {path}: {reason}")]
    Labels { path: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ModelCacheError> for PipelineError {
    fn from(err: ModelCacheError) -> Self {
        match err {
            ModelCacheError::ModelNotFound(id)
            | ModelCacheError::OutsideRegistry(id)
            | ModelCacheError::InvalidModelId(id) => Self::ModelNotFound(id),
            ModelCacheError::RegistryNotFound(root) => {
                Self::ModelNotFound(format!("registry root {} does not exist", root.display()))
            }
            ModelCacheError::Io(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<OnnxError> for PipelineError {
    fn from(err: OnnxError) -> Self {
        match err {
            OnnxError::ModelNotFound(path) => Self::ModelNotFound(path.display().to_string()),
            other => Self::ExecutionFailed(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Worker task failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
