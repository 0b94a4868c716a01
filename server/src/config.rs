//! Configuration system for the OnnxAI server.
//!
//! Supports:
//! - CLI arguments and environment variables (highest priority)
//! - TOML config file
//! - Defaults (lowest priority)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use onnxai_api::ApiConfig;
use onnxai_onnx_loader::SessionOptions;
use onnxai_pipeline::PreprocessConfig;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "onnxai.toml";

/// Command-line arguments for the OnnxAI server.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "onnxai-server")]
#[command(about = "OnnxAI - image classification with ONNX models from a local registry")]
#[command(version)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file path
    #[arg(long, short = 'c', env = "ONNXAI_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Interface to bind
    #[arg(long, env = "ONNXAI_HOST", global = true)]
    pub host: Option<IpAddr>,

    /// HTTP port
    #[arg(long, short = 'p', env = "ONNXAI_PORT", global = true)]
    pub port: Option<u16>,

    /// Model registry root
    #[arg(long, env = "MODELS_DIR", global = true)]
    pub models_dir: Option<PathBuf>,

    /// Static assets directory
    #[arg(long, env = "ASSETS_DIR", global = true)]
    pub assets_dir: Option<PathBuf>,

    /// Directory for requests.log and system.log
    #[arg(long, env = "LOGS_DIR", global = true)]
    pub logs_dir: Option<PathBuf>,

    /// Class label table (JSON)
    #[arg(long, env = "LABELS_PATH", global = true)]
    pub labels_path: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Maximum concurrent model executions
    #[arg(long, env = "NUM_WORKERS", global = true)]
    pub workers: Option<usize>,

    /// Loaded sessions kept in memory (0 disables caching)
    #[arg(long, env = "ONNXAI_SESSION_CACHE", global = true)]
    pub session_cache: Option<usize>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Classify image files and print one JSON line per file
    Classify {
        /// Model identifier relative to the registry root
        #[arg(long, short = 'm')]
        model: String,

        /// Include raw scores in the output
        #[arg(long)]
        scores: bool,

        /// Image files
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
}

/// Full server configuration (merged from all sources).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http: HttpConfig,
    pub registry: RegistryConfig,
    pub inference: InferenceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub max_body_size: usize,
    pub timeout_secs: u64,
    pub enable_swagger: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
            max_body_size: 10 * 1024 * 1024, // 10MB
            timeout_secs: 60,
            enable_swagger: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub models_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub labels_path: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("./models"),
            assets_dir: PathBuf::from("./assets"),
            labels_path: PathBuf::from("./assets/labels.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Concurrent model executions
    pub workers: usize,
    /// Loaded sessions kept in memory
    pub session_cache: usize,
    #[serde(flatten)]
    pub preprocess: PreprocessConfig,
    #[serde(flatten)]
    pub session: SessionOptions,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            session_cache: 4,
            preprocess: PreprocessConfig::default(),
            session: SessionOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `None` logs to the console only
    pub logs_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            logs_dir: Some(PathBuf::from("./logs")),
        }
    }
}

impl ServerConfig {
    /// Load configuration from CLI args and optional config file.
    ///
    /// Priority: CLI args / environment > config file > defaults. An
    /// explicitly named config file must exist; `onnxai.toml` in the working
    /// directory is used when present.
    pub fn load(args: &CliArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_args(args);
        Ok(config)
    }

    /// Load configuration from a TOML file; absent keys take defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Override with CLI args (highest priority)
    pub fn apply_args(&mut self, args: &CliArgs) {
        if let Some(host) = args.host {
            self.http.host = host;
        }
        if let Some(port) = args.port {
            self.http.port = port;
        }
        if let Some(ref dir) = args.models_dir {
            self.registry.models_dir = dir.clone();
        }
        if let Some(ref dir) = args.assets_dir {
            self.registry.assets_dir = dir.clone();
        }
        if let Some(ref path) = args.labels_path {
            self.registry.labels_path = path.clone();
        }
        if let Some(ref dir) = args.logs_dir {
            self.logging.logs_dir = Some(dir.clone());
        }
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
        if let Some(workers) = args.workers {
            self.inference.workers = workers;
        }
        if let Some(capacity) = args.session_cache {
            self.inference.session_cache = capacity;
        }
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            host: self.http.host,
            port: self.http.port,
            enable_cors: self.http.enable_cors,
            cors_origins: self.http.cors_origins.clone(),
            timeout_secs: self.http.timeout_secs,
            max_body_bytes: self.http.max_body_size,
            enable_swagger: self.http.enable_swagger,
            assets_dir: self.registry.assets_dir.clone(),
        }
    }
}
