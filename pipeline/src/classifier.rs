/// Image classification orchestration
///
/// Runs decode → orient → resize → pad → tensor on the blocking pool,
/// resolves the model inside the registry, executes it under a concurrency
/// bound, and maps the arg-max score to a label.
use crate::engine::ExecutionEngine;
use crate::error::{PipelineError, Result};
use crate::postprocess::{argmax, LabelMap};
use crate::preprocess;
use crate::types::{InferenceResult, PreprocessConfig};
use ndarray::Array4;
use onnxai_model_cache::ModelRegistry;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub struct ImageClassifier {
    registry: ModelRegistry,
    labels: Arc<LabelMap>,
    engine: Arc<dyn ExecutionEngine>,
    config: PreprocessConfig,
    permits: Arc<Semaphore>,
    max_concurrency: usize,
}

impl std::fmt::Debug for ImageClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageClassifier")
            .field("registry", &self.registry)
            .field("labels", &self.labels.len())
            .field("config", &self.config)
            .field("max_concurrency", &self.max_concurrency)
            .finish_non_exhaustive()
    }
}

impl ImageClassifier {
    /// `max_concurrency` bounds simultaneous model executions (minimum 1)
    pub fn new(
        registry: ModelRegistry,
        labels: Arc<LabelMap>,
        engine: Arc<dyn ExecutionEngine>,
        config: PreprocessConfig,
        max_concurrency: usize,
    ) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            registry,
            labels,
            engine,
            config,
            permits: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Synchronous preprocessing with this classifier's settings
    pub fn preprocess(&self, bytes: &[u8]) -> Result<Array4<f32>> {
        preprocess::preprocess(bytes, &self.config)
    }

    pub async fn classify(&self, bytes: Vec<u8>, model_id: &str) -> Result<InferenceResult> {
        let config = self.config;
        let tensor =
            tokio::task::spawn_blocking(move || preprocess::preprocess(&bytes, &config)).await??;

        let model = self.registry.resolve(model_id).map_err(|e| {
            log::warn!("Model lookup failed for '{}': {}", model_id, e);
            PipelineError::from(e)
        })?;

        let output = {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|e| PipelineError::Internal(e.to_string()))?;
            self.engine.execute(&model, tensor).await?
        };

        let class_index = argmax(&output.data).ok_or_else(|| {
            PipelineError::ExecutionFailed(format!(
                "model '{}' produced no usable scores",
                model_id
            ))
        })?;
        let label = self.labels.label_for(class_index).to_string();

        log::info!("Classified with '{}': {} ({})", model_id, class_index, label);

        Ok(InferenceResult {
            model: model_id.to_string(),
            class_index,
            label,
            scores: output.data,
        })
    }

    /// Classify each image in turn; one failure does not stop the rest
    pub async fn classify_batch(
        &self,
        images: Vec<Vec<u8>>,
        model_id: &str,
    ) -> Vec<Result<InferenceResult>> {
        let mut results = Vec::with_capacity(images.len());
        for bytes in images {
            results.push(self.classify(bytes, model_id).await);
        }
        results
    }
}
