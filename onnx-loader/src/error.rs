use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OnnxError>;

#[derive(Error, Debug)]
pub enum OnnxError {
    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Failed to load model: {0}")]
    ModelLoadFailed(String),

    #[error("Failed to create session: {0}")]
    SessionCreationFailed(String),

    #[error("Model declares no inputs: {0}")]
    NoInputs(PathBuf),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Model produced no output")]
    NoOutput,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
