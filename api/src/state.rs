//! Shared handler state.

use crate::config::ApiConfig;
use onnxai_model_cache::ModelRegistry;
use onnxai_pipeline::ImageClassifier;
use std::sync::Arc;

/// State cloned into every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    classifier: Arc<ImageClassifier>,
    config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(classifier: Arc<ImageClassifier>, config: ApiConfig) -> Self {
        Self {
            classifier,
            config: Arc::new(config),
        }
    }

    pub fn classifier(&self) -> &ImageClassifier {
        &self.classifier
    }

    pub fn registry(&self) -> &ModelRegistry {
        self.classifier.registry()
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}
