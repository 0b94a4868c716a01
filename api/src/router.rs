//! Router configuration and setup.

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{
    services::ServeFile,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{middleware, routes, state::AppState};

/// Build the full application router with middleware and state applied.
pub fn build_router(state: AppState) -> Router {
    let config = state.config().clone();

    let mut router = Router::new()
        .route("/health", get(routes::health::health))
        .route("/registry", get(routes::registry::list_registry))
        .route(
            "/registry/{dataset_version}/{arch_name}/{model_name}",
            get(routes::registry::model_info),
        )
        .route("/predict", post(routes::predict::predict))
        .route("/predict/batch", post(routes::predict::predict_batch))
        .route_service("/favicon.ico", ServeFile::new(config.favicon_path()));

    if config.enable_swagger {
        router = router.merge(
            SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", routes::ApiDoc::openapi()),
        );
    }

    // Outermost layer last: access log sees the final status, timeouts included
    router
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeout_secs)))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false))
                .on_response(DefaultOnResponse::new()),
        )
        .layer(middleware::cors_layer(&config))
        .layer(from_fn(middleware::log_requests))
        .with_state(state)
}
