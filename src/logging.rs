//! Logging setup built on `tracing-subscriber`.
//!
//! `RUST_LOG` takes precedence over the configured filter. When file logging
//! is enabled, a daily rolling file is written alongside stderr output; keep
//! the returned guard alive for as long as records should be flushed.

use crate::error::{PipeStoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor the configuration sets one
pub const DEFAULT_LOG_FILTER: &str = "info,pipestore=debug";

/// Prefix of rolling log file names
pub const DEFAULT_FILE_PREFIX: &str = "pipestore.log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives
    pub filter: String,

    /// Also write to a daily rolling file
    pub file: bool,

    /// Directory for log files, the application data directory if unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    pub file_prefix: String,

    /// Colored stderr output
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            file: false,
            log_dir: None,
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Filter from `RUST_LOG`, falling back to the configured directives
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.filter))
    }

    pub fn resolved_log_dir(&self) -> Option<PathBuf> {
        self.log_dir.clone().or_else(default_log_dir)
    }
}

/// `<data dir>/pipestore/logs`
pub fn default_log_dir() -> Option<PathBuf> {
    crate::config::app_data_dir().map(|p| p.join("logs"))
}

/// Install the global subscriber.
///
/// Fails with a configuration error if a subscriber is already installed or
/// the log directory cannot be created.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_ansi(config.ansi)
        .with_writer(std::io::stderr);

    if !config.file {
        tracing_subscriber::registry()
            .with(config.env_filter())
            .with(stderr_layer)
            .try_init()
            .map_err(|e| PipeStoreError::Config(format!("Failed to install logger: {}", e)))?;
        return Ok(None);
    }

    let dir = config.resolved_log_dir().ok_or_else(|| {
        PipeStoreError::Config("Could not determine a log directory".to_string())
    })?;
    std::fs::create_dir_all(&dir).map_err(|e| {
        PipeStoreError::Config(format!("Failed to create log directory {:?}: {}", dir, e))
    })?;

    let appender = tracing_appender::rolling::daily(&dir, &config.file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| PipeStoreError::Config(format!("Failed to install logger: {}", e)))?;

    tracing::debug!("Logging to {:?}", dir);
    Ok(Some(guard))
}
