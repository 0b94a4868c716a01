/// Execution engine seam
///
/// The classifier hands a resolved model path and an input tensor to an
/// [`ExecutionEngine`]. [`OnnxEngine`] is the production backend: it loads
/// sessions through a [`SessionCache`] and runs them on the blocking pool.
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use ndarray::Array4;
use onnxai_model_cache::{CacheStats, ModelPath, SessionCache};
use onnxai_onnx_loader::{ModelOutput, OnnxSession, SessionOptions};
use std::sync::Arc;

#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Run `input` through the model at `model` and return its first output
    async fn execute(&self, model: &ModelPath, input: Array4<f32>) -> Result<ModelOutput>;

    /// Session cache counters, if the engine keeps one
    fn cache_stats(&self) -> Option<CacheStats> {
        None
    }
}

pub struct OnnxEngine {
    sessions: SessionCache<OnnxSession>,
    options: SessionOptions,
}

impl OnnxEngine {
    pub fn new(options: SessionOptions, cache_capacity: usize) -> Self {
        log::info!(
            "ONNX engine: {} intra threads, providers {:?}, session cache {}",
            options.intra_threads,
            options.execution_providers,
            cache_capacity
        );
        Self {
            sessions: SessionCache::new(cache_capacity),
            options,
        }
    }

    pub fn sessions(&self) -> &SessionCache<OnnxSession> {
        &self.sessions
    }

    async fn session_for(&self, model: &ModelPath) -> Result<Arc<OnnxSession>> {
        let path = model.path.clone();
        let options = self.options.clone();

        self.sessions
            .get_or_try_load(&model.path, || async move {
                tokio::task::spawn_blocking(move || OnnxSession::load_with_options(&path, &options))
                    .await
                    .map_err(PipelineError::from)
                    .and_then(|loaded| loaded.map_err(PipelineError::from))
            })
            .await
    }
}

#[async_trait]
impl ExecutionEngine for OnnxEngine {
    async fn execute(&self, model: &ModelPath, input: Array4<f32>) -> Result<ModelOutput> {
        let session = self.session_for(model).await?;

        let output = tokio::task::spawn_blocking(move || session.run(input)).await??;

        log::debug!(
            "Model '{}' produced {} scores from '{}'",
            model.id,
            output.data.len(),
            output.name
        );
        Ok(output)
    }

    fn cache_stats(&self) -> Option<CacheStats> {
        Some(self.sessions.stats())
    }
}
