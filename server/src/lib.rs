//! OnnxAI Server
//!
//! Wires configuration, logging, the model registry, the ONNX engine and the
//! classifier together, then either serves the HTTP API (`onnxai-api`) or
//! classifies files from the command line.

pub mod config;
pub mod logging;

pub use config::{CliArgs, Command, ServerConfig};

use anyhow::{Context, Result};
use onnxai_api::AppState;
use onnxai_model_cache::ModelRegistry;
use onnxai_pipeline::{ImageClassifier, LabelMap, OnnxEngine};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Read the label table; a missing file yields an empty table so every
/// class maps to "Unknown".
pub fn load_labels(path: &Path) -> Result<LabelMap> {
    if !path.exists() {
        warn!("Label file {} not found, every class will be reported as Unknown", path.display());
        return Ok(LabelMap::empty());
    }
    LabelMap::from_path(path).with_context(|| format!("Failed to load labels from {:?}", path))
}

/// Build the classifier described by `config`.
pub fn build_classifier(config: &ServerConfig) -> Result<ImageClassifier> {
    let labels = load_labels(&config.registry.labels_path)?;

    let registry = ModelRegistry::new(&config.registry.models_dir);
    match registry.canonical_root() {
        Ok(root) => info!("Model registry: {}", root.display()),
        Err(e) => warn!("{}; requests will fail until it exists", e),
    }

    let engine = OnnxEngine::new(
        config.inference.session.clone(),
        config.inference.session_cache,
    );

    Ok(ImageClassifier::new(
        registry,
        Arc::new(labels),
        Arc::new(engine),
        config.inference.preprocess,
        config.inference.workers,
    ))
}

/// Run the HTTP API until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let classifier = build_classifier(&config)?;
    let api_config = config.api_config();
    let addr = api_config.bind_addr();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    let state = AppState::new(Arc::new(classifier), api_config);
    onnxai_api::run_server_on(listener, state, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// One line of `classify` output.
#[derive(Debug, Serialize)]
pub struct FileOutcome {
    pub file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Classify files in order; unreadable or undecodable files are reported
/// in their own outcome.
pub async fn classify_files(
    classifier: &ImageClassifier,
    model: &str,
    images: &[PathBuf],
    include_scores: bool,
) -> Vec<FileOutcome> {
    let mut outcomes = Vec::with_capacity(images.len());

    for file in images {
        let result = match tokio::fs::read(file).await {
            Ok(bytes) => classifier.classify(bytes, model).await.map_err(|e| e.to_string()),
            Err(e) => Err(format!("Failed to read file: {}", e)),
        };

        outcomes.push(match result {
            Ok(result) => FileOutcome {
                file: file.clone(),
                class_index: Some(result.class_index),
                label: Some(result.label),
                scores: include_scores.then_some(result.scores),
                error: None,
            },
            Err(error) => FileOutcome {
                file: file.clone(),
                class_index: None,
                label: None,
                scores: None,
                error: Some(error),
            },
        });
    }

    outcomes
}
