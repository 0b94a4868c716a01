//! Image classification endpoints.
//!
//! Both endpoints take `multipart/form-data`. `/predict` classifies one
//! upload; `/predict/batch` classifies every `input_files` part in order and
//! reports each file's outcome separately.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Form accepted by `POST /predict`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct PredictForm {
    /// Model identifier relative to the registry root
    model_name: String,
    /// Encoded image
    #[schema(value_type = String, format = Binary)]
    input_data: Vec<u8>,
    /// Return the raw score vector as well
    include_scores: Option<bool>,
}

/// Form accepted by `POST /predict/batch`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct BatchPredictForm {
    model_name: String,
    /// One part per image
    #[schema(value_type = Vec<String>)]
    input_files: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PredictResponse {
    pub model: String,
    pub filename: String,
    /// Upload size in bytes
    pub size: usize,
    pub class_index: usize,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<f32>>,
}

/// Outcome for one file of a batch; exactly one of `label` or `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BatchEntry {
    pub filename: String,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BatchPredictResponse {
    pub model: String,
    pub results: Vec<BatchEntry>,
}

struct Upload {
    filename: String,
    data: Bytes,
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn require_model_name(model_name: Option<String>) -> ApiResult<String> {
    match model_name {
        Some(name) if !name.trim().is_empty() => Ok(name.trim().to_string()),
        _ => Err(ApiError::missing_field("model_name")),
    }
}

async fn read_upload(field: axum::extract::multipart::Field<'_>) -> ApiResult<Upload> {
    let filename = field.file_name().unwrap_or("upload").to_string();
    let data = field.bytes().await?;
    Ok(Upload { filename, data })
}

/// Classify a single image.
#[utoipa::path(
    post,
    path = "/predict",
    tag = "Inference",
    request_body(content = PredictForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Predicted class", body = PredictResponse),
        (status = 400, description = "Missing field or undecodable image", body = crate::error::ProblemDetails),
        (status = 404, description = "Model not found", body = crate::error::ProblemDetails),
        (status = 500, description = "Model failed to run", body = crate::error::ProblemDetails)
    )
)]
pub async fn predict(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<PredictResponse>> {
    let request_id = uuid::Uuid::new_v4();
    let mut model_name = None;
    let mut upload = None;
    let mut include_scores = false;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("model_name") => model_name = Some(field.text().await?),
            Some("input_data") => upload = Some(read_upload(field).await?),
            Some("include_scores") => include_scores = parse_flag(&field.text().await?),
            other => tracing::debug!(request_id = %request_id, field = ?other, "Ignoring form field"),
        }
    }

    let model_name = require_model_name(model_name)?;
    let upload = upload.ok_or_else(|| ApiError::missing_field("input_data"))?;
    let size = upload.data.len();

    tracing::info!(
        request_id = %request_id,
        model = %model_name,
        filename = %upload.filename,
        size,
        "Prediction request"
    );

    let started = Instant::now();
    let result = state
        .classifier()
        .classify(upload.data.to_vec(), &model_name)
        .await?;

    tracing::info!(
        request_id = %request_id,
        model = %model_name,
        class_index = result.class_index,
        label = %result.label,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Prediction complete"
    );

    Ok(Json(PredictResponse {
        model: result.model,
        filename: upload.filename,
        size,
        class_index: result.class_index,
        label: result.label,
        scores: include_scores.then_some(result.scores),
    }))
}

/// Classify several images with one model.
///
/// An unknown model fails the whole request; per-image failures are
/// reported in that image's entry.
#[utoipa::path(
    post,
    path = "/predict/batch",
    tag = "Inference",
    request_body(content = BatchPredictForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Per-file results", body = BatchPredictResponse),
        (status = 400, description = "Missing field", body = crate::error::ProblemDetails),
        (status = 404, description = "Model not found", body = crate::error::ProblemDetails)
    )
)]
pub async fn predict_batch(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<BatchPredictResponse>> {
    let request_id = uuid::Uuid::new_v4();
    let mut model_name = None;
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("model_name") => model_name = Some(field.text().await?),
            Some("input_files") => uploads.push(read_upload(field).await?),
            other => tracing::debug!(request_id = %request_id, field = ?other, "Ignoring form field"),
        }
    }

    let model_name = require_model_name(model_name)?;
    if uploads.is_empty() {
        return Err(ApiError::missing_field("input_files"));
    }

    state
        .registry()
        .resolve(&model_name)
        .map_err(onnxai_pipeline::PipelineError::from)?;

    tracing::info!(
        request_id = %request_id,
        model = %model_name,
        files = uploads.len(),
        "Batch prediction request"
    );

    let started = Instant::now();
    let images = uploads.iter().map(|u| u.data.to_vec()).collect();
    let outcomes = state.classifier().classify_batch(images, &model_name).await;

    let results: Vec<BatchEntry> = uploads
        .into_iter()
        .zip(outcomes)
        .map(|(upload, outcome)| {
            let size = upload.data.len();
            match outcome {
                Ok(result) => BatchEntry {
                    filename: upload.filename,
                    size,
                    class_index: Some(result.class_index),
                    label: Some(result.label),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(request_id = %request_id, filename = %upload.filename, error = %e, "Batch item failed");
                    BatchEntry {
                        filename: upload.filename,
                        size,
                        class_index: None,
                        label: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        })
        .collect();

    tracing::info!(
        request_id = %request_id,
        model = %model_name,
        succeeded = results.iter().filter(|r| r.error.is_none()).count(),
        failed = results.iter().filter(|r| r.error.is_some()).count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Batch prediction complete"
    );

    Ok(Json(BatchPredictResponse {
        model: model_name,
        results,
    }))
}
