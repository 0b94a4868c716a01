//! ONNX Session management for fixed-shape image models

use crate::error::{OnnxError, Result};
use crate::providers::{self, ExecutionBackend};
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Session construction options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Threads used within a single operator
    pub intra_threads: usize,
    /// Providers in priority order; CPU is appended automatically
    pub execution_providers: Vec<ExecutionBackend>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            intra_threads: 4,
            execution_providers: vec![ExecutionBackend::Cpu],
        }
    }
}

/// First output of a forward pass, copied out of the runtime
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    pub name: String,
    pub shape: Vec<i64>,
    pub data: Vec<f32>,
}

/// Loaded ONNX model ready for single-input inference
///
/// Wraps `ort::Session` with the model's declared input and output names
/// discovered at load time. A forward pass needs exclusive access to the
/// runtime session, so it sits behind a mutex; share the whole handle through
/// an `Arc`.
pub struct OnnxSession {
    model_path: PathBuf,
    input_name: String,
    output_name: String,
    session: Mutex<Session>,
}

impl std::fmt::Debug for OnnxSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxSession")
            .field("model_path", &self.model_path)
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .finish_non_exhaustive()
    }
}

impl OnnxSession {
    /// Load ONNX model with default options (CPU, Level3 optimization)
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        Self::load_with_options(model_path, &SessionOptions::default())
    }

    /// Load ONNX model with explicit options
    pub fn load_with_options<P: AsRef<Path>>(model_path: P, options: &SessionOptions) -> Result<Self> {
        let model_path = model_path.as_ref();
        log::info!("Loading ONNX model from: {:?}", model_path);

        if !model_path.is_file() {
            return Err(OnnxError::ModelNotFound(model_path.to_path_buf()));
        }

        let ort_providers = providers::to_ort_providers(&options.execution_providers);
        log::debug!("Configuring session with {} execution providers", ort_providers.len());

        let session = Session::builder()
            .map_err(|e| OnnxError::SessionCreationFailed(e.to_string()))?
            .with_execution_providers(ort_providers)
            .map_err(|e| OnnxError::SessionCreationFailed(
                format!("Failed to set execution providers: {}", e)
            ))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| OnnxError::SessionCreationFailed(
                format!("Failed to set optimization level: {}", e)
            ))?
            .with_intra_threads(options.intra_threads.max(1))
            .map_err(|e| OnnxError::SessionCreationFailed(
                format!("Failed to set intra threads: {}", e)
            ))?
            .commit_from_file(model_path)
            .map_err(|e| OnnxError::ModelLoadFailed(e.to_string()))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| OnnxError::NoInputs(model_path.to_path_buf()))?;

        if session.inputs.len() > 1 {
            log::warn!(
                "Model {:?} declares {} inputs; only '{}' will be fed",
                model_path,
                session.inputs.len(),
                input_name
            );
        }

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or(OnnxError::NoOutput)?;

        log::info!(
            "ONNX model loaded: input '{}', output '{}'",
            input_name,
            output_name
        );

        Ok(Self {
            model_path: model_path.to_path_buf(),
            input_name,
            output_name,
            session: Mutex::new(session),
        })
    }

    /// Get model path
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Name of the model's first declared input
    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    /// Name of the model's first declared output
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Run a forward pass and return the first output as flat f32 data
    pub fn run(&self, input: Array4<f32>) -> Result<ModelOutput> {
        let tensor = Tensor::from_array(input)
            .map_err(|e| OnnxError::InvalidInput(format!("Failed to create input tensor: {}", e)))?;

        let mut session = self.session.lock().map_err(|_| OnnxError::LockPoisoned)?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(|e| OnnxError::InferenceFailed(e.to_string()))?;

        let value = outputs.get(self.output_name.as_str()).ok_or(OnnxError::NoOutput)?;

        let (shape, data) = value
            .try_extract_tensor::<f32>()
            .map_err(|e| OnnxError::InferenceFailed(format!("Failed to extract output tensor: {}", e)))?;

        log::debug!("Output '{}' shape {:?}", self.output_name, &shape[..]);

        ModelOutput::from_parts(&self.output_name, &shape[..], data)
    }
}

impl ModelOutput {
    /// Copy an extracted tensor out of the runtime; an empty tensor is `NoOutput`
    pub fn from_parts(name: &str, shape: &[i64], data: &[f32]) -> Result<Self> {
        if data.is_empty() {
            return Err(OnnxError::NoOutput);
        }

        Ok(Self {
            name: name.to_string(),
            shape: shape.to_vec(),
            data: data.to_vec(),
        })
    }
}
