//! HTTP middleware.

mod cors;
mod request_log;

pub use cors::cors_layer;
pub use request_log::{log_requests, REQUEST_LOG_TARGET};
