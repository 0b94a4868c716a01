//! OnnxAI API Crate
//!
//! HTTP layer over the classification pipeline, built on Axum:
//! - `GET /health`, `GET /registry`, `GET /registry/{dataset}/{arch}/{model}`
//! - `POST /predict` and `POST /predict/batch` (multipart uploads)
//! - OpenAPI/Swagger documentation, CORS, timeouts, body limits
//! - Access logging under the `onnxai::request` tracing target
//!
//! # Usage
//!
//! ```rust,no_run
//! use onnxai_api::{run_server, ApiConfig, AppState};
//! use onnxai_model_cache::ModelRegistry;
//! use onnxai_onnx_loader::SessionOptions;
//! use onnxai_pipeline::{ImageClassifier, LabelMap, OnnxEngine, PreprocessConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let classifier = ImageClassifier::new(
//!         ModelRegistry::new("models"),
//!         Arc::new(LabelMap::empty()),
//!         Arc::new(OnnxEngine::new(SessionOptions::default(), 4)),
//!         PreprocessConfig::default(),
//!         2,
//!     );
//!     let state = AppState::new(Arc::new(classifier), ApiConfig::default());
//!     run_server(state).await
//! }
//! ```

#![deny(unsafe_code)]

mod config;
mod error;
mod middleware;
mod router;
pub mod routes;
mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ProblemDetails};
pub use middleware::REQUEST_LOG_TARGET;
pub use router::build_router;
pub use state::AppState;

use std::net::SocketAddr;

/// Bind to the configured address and serve until the process is stopped.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn run_server(state: AppState) -> anyhow::Result<()> {
    let addr = state.config().bind_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_server_on(listener, state, std::future::pending()).await
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn run_server_on<F>(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    let swagger = state.config().enable_swagger;

    tracing::info!("OnnxAI API server listening on http://{}", addr);
    if swagger {
        tracing::info!("Swagger UI:    http://{}/swagger-ui/", addr);
        tracing::info!("OpenAPI Spec:  http://{}/api-doc/openapi.json", addr);
    }

    let app = build_router(state);
    let service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("OnnxAI API server stopped");
    Ok(())
}
