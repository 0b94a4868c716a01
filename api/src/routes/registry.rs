//! Model registry browsing.

use axum::{
    extract::{Path, State},
    Json,
};
use onnxai_model_cache::{ModelInfo, RegistryListing};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Nested `{dataset_version: {arch_name: {model_name: entry}}}` listing.
#[utoipa::path(
    get,
    path = "/registry",
    tag = "Registry",
    responses(
        (status = 200, description = "Registry tree", body = Object),
        (status = 404, description = "Registry root missing", body = crate::error::ProblemDetails)
    )
)]
pub async fn list_registry(State(state): State<AppState>) -> ApiResult<Json<RegistryListing>> {
    let registry = state.registry().clone();
    let listing = tokio::task::spawn_blocking(move || registry.list())
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))??;

    tracing::debug!(dataset_versions = listing.len(), "Registry listed");
    Ok(Json(listing))
}

/// One registry entry with its artifact path and metadata status.
#[utoipa::path(
    get,
    path = "/registry/{dataset_version}/{arch_name}/{model_name}",
    tag = "Registry",
    params(
        ("dataset_version" = String, Path, description = "Dataset version directory"),
        ("arch_name" = String, Path, description = "Architecture directory"),
        ("model_name" = String, Path, description = "Model directory")
    ),
    responses(
        (status = 200, description = "Registry entry", body = Object),
        (status = 404, description = "No such model", body = crate::error::ProblemDetails)
    )
)]
pub async fn model_info(
    State(state): State<AppState>,
    Path((dataset_version, arch_name, model_name)): Path<(String, String, String)>,
) -> ApiResult<Json<ModelInfo>> {
    let registry = state.registry().clone();
    let info = tokio::task::spawn_blocking(move || {
        registry.model_info(&dataset_version, &arch_name, &model_name)
    })
    .await
    .map_err(|e| ApiError::InternalError(e.to_string()))??;

    Ok(Json(info))
}
