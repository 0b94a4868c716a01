//! Tracing subscriber setup.
//!
//! Console output is filtered by `RUST_LOG`, falling back to the configured
//! level. With a logs directory, two JSON files are written as well:
//! `requests.log` holds access-log events and `system.log` everything else.
//! `log` records from the library crates are bridged into the same sinks.

use anyhow::{Context, Result};
use onnxai_api::REQUEST_LOG_TARGET;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{
    filter::filter_fn, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::config::LoggingConfig;

pub const REQUESTS_LOG: &str = "requests.log";
pub const SYSTEM_LOG: &str = "system.log";

/// Parse a level name, accepting `warning` and any case.
pub fn parse_level(level: &str) -> Result<Level> {
    match level.trim().to_ascii_lowercase().as_str() {
        "warning" => Ok(Level::WARN),
        other => other
            .parse::<Level>()
            .map_err(|_| anyhow::anyhow!("Unknown log level '{}'", level)),
    }
}

fn open_append(path: &Path) -> Result<Arc<File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {:?}", path))?;
    Ok(Arc::new(file))
}

/// Install the global subscriber. Call once, before any other work.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let level = parse_level(&config.level)?;
    let default_directive = format!(
        "{level},onnxai_server={level},onnxai_api={level},tower_http=info",
        level = level.as_str().to_ascii_lowercase()
    );

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let console = fmt::layer().with_target(true).with_filter(console_filter);

    let (requests, system) = match &config.logs_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create logs directory {:?}", dir))?;

            let requests = fmt::layer()
                .json()
                .with_writer(open_append(&dir.join(REQUESTS_LOG))?)
                .with_filter(filter_fn(|meta| meta.target() == REQUEST_LOG_TARGET));

            let system = fmt::layer()
                .json()
                .with_writer(open_append(&dir.join(SYSTEM_LOG))?)
                .with_filter(filter_fn(move |meta| {
                    meta.target() != REQUEST_LOG_TARGET && *meta.level() <= level
                }));

            (Some(requests), Some(system))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(requests)
        .with(system)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
