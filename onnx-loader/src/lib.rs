//! ONNX Runtime inference loader
//!
//! Thin wrapper around the `ort` crate for single-input image models:
//! - Session creation with graph optimization and configurable providers
//! - Discovery of the model's declared input/output names
//! - Forward pass returning the first output as flat `f32` scores

pub mod error;
pub mod providers;
pub mod session;

pub use error::{OnnxError, Result};
pub use providers::{to_ort_providers, ExecutionBackend};
pub use session::{ModelOutput, OnnxSession, SessionOptions};

/// Re-export `ort` for callers that need direct runtime access
pub use ort;
