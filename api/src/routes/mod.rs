//! API route handlers.

pub mod health;
pub mod predict;
pub mod registry;

use utoipa::OpenApi;

/// OpenAPI documentation for all routes.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "OnnxAI API",
        version = "1.0.0",
        description = "Image classification with ONNX models from a local registry",
        license(name = "MIT"),
        contact(
            name = "OnnxAI Team",
            url = "https://github.com/onnxai/onnxai-server"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development")
    ),
    paths(
        health::health,
        registry::list_registry,
        registry::model_info,
        predict::predict,
        predict::predict_batch,
    ),
    components(schemas(
        health::HealthResponse,
        predict::PredictForm,
        predict::BatchPredictForm,
        predict::PredictResponse,
        predict::BatchEntry,
        predict::BatchPredictResponse,
        crate::error::ProblemDetails,
    )),
    tags(
        (name = "System", description = "Liveness"),
        (name = "Registry", description = "Browse available models"),
        (name = "Inference", description = "Classify images")
    )
)]
pub struct ApiDoc;
