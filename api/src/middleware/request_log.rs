//! Per-request access logging.
//!
//! Every request produces one event under [`REQUEST_LOG_TARGET`] so the
//! server can route access logs to their own sink.

use axum::{
    extract::{ConnectInfo, Request},
    http::header::CONTENT_LENGTH,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;

/// Tracing target of access-log events.
pub const REQUEST_LOG_TARGET: &str = "onnxai::request";

pub async fn log_requests(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = request.uri().query().unwrap_or_default().to_string();
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let content_length = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    let response = next.run(request).await;

    tracing::info!(
        target: REQUEST_LOG_TARGET,
        method = %method,
        path = %path,
        query = %query,
        status = response.status().as_u16(),
        process_time_ms = started.elapsed().as_secs_f64() * 1000.0,
        client = %client,
        content_length,
        "request"
    );

    response
}
