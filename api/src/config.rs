//! API configuration.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Configuration for the HTTP API server.
///
/// # Example
///
/// ```rust
/// use onnxai_api::ApiConfig;
///
/// let config = ApiConfig {
///     port: 9000,
///     enable_swagger: false,
///     ..ApiConfig::default()
/// };
/// assert_eq!(config.bind_addr().port(), 9000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Interface to bind.
    ///
    /// Default: 0.0.0.0
    pub host: IpAddr,

    /// Port to bind the HTTP server to.
    ///
    /// Default: 8000
    pub port: u16,

    /// Enable Cross-Origin Resource Sharing (CORS).
    ///
    /// Default: true
    pub enable_cors: bool,

    /// Allowed origins for CORS requests. `["*"]` allows any origin.
    ///
    /// Default: `["*"]`
    pub cors_origins: Vec<String>,

    /// Request timeout in seconds.
    ///
    /// Default: 60
    pub timeout_secs: u64,

    /// Largest accepted request body in bytes, multipart uploads included.
    ///
    /// Default: 10 MiB
    pub max_body_bytes: usize,

    /// Serve Swagger UI at `/swagger-ui` and the document at `/api-doc/openapi.json`.
    ///
    /// Default: true
    pub enable_swagger: bool,

    /// Directory holding static assets (`ico/onnxai-icon.ico`).
    ///
    /// Default: ./assets
    pub assets_dir: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
            timeout_secs: 60,
            max_body_bytes: 10 * 1024 * 1024,
            enable_swagger: true,
            assets_dir: PathBuf::from("./assets"),
        }
    }
}

impl ApiConfig {
    /// Stricter settings: explicit CORS origins, no Swagger UI.
    pub fn production(allowed_origins: Vec<String>) -> Self {
        Self {
            enable_swagger: false,
            cors_origins: allowed_origins,
            ..Default::default()
        }
    }

    /// Permissive settings for local work, bound to loopback.
    pub fn development() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            cors_origins: vec!["*".to_string()],
            enable_swagger: true,
            ..Default::default()
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn favicon_path(&self) -> PathBuf {
        self.assets_dir.join("ico").join("onnxai-icon.ico")
    }
}
