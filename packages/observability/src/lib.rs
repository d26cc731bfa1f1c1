//! # Observability
//!
//! Logging initialisation shared by the TCPWebLog agents.
//!
//! ## Design Philosophy
//!
//! Agents are **log producers**. They call `observability::init_with_config()` once at
//! startup and use standard `tracing` macros everywhere else. Diagnostics go
//! to stderr, which is where a web server collects the output of its piped
//! loggers, and never to stdout.
//!
//! Optionally every event is also appended as one JSON object per line to a
//! file, for `tail -f agent.jsonl | jq` style inspection.
//!
//! ## Usage
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "tcpweblog-client".into(),
//!     default_level: "debug".into(),
//!     log_path: Some("/var/log/tcpweblog/client.jsonl".into()),
//!     ..Default::default()
//! })?;
//! ```

mod file_writer;
mod jsonl_layer;

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use file_writer::JsonlFileWriter;
pub use jsonl_layer::JsonlLayer;

/// Errors raised while installing the global subscriber.
#[derive(Error, Debug)]
pub enum ObservabilityError {
    /// The JSONL log file could not be created or opened.
    #[error("failed to open log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Another subscriber was installed first.
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the agent, included in every JSONL line.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional JSONL file receiving a copy of every event.
    pub log_path: Option<PathBuf>,

    /// Emit human-readable logs on stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: true,
        }
    }
}

/// Initialize the observability layer with custom configuration.
pub fn init_with_config(config: LogConfig) -> Result<(), ObservabilityError> {
    let json_layer = match &config.log_path {
        Some(path) => {
            let writer = JsonlFileWriter::new(path).map_err(|source| ObservabilityError::LogFile {
                path: path.clone(),
                source,
            })?;
            Some(
                JsonlLayer::new(config.service_name.clone(), writer)
                    .with_filter(env_filter(&config.default_level)),
            )
        }
        None => None,
    };

    // stderr usually ends up in the web server's error log: no colours
    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(false)
            .compact()
            .with_writer(io::stderr)
            .with_filter(env_filter(&config.default_level))
    });

    tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|_| ObservabilityError::AlreadyInitialized)?;

    Ok(())
}

/// Build the level filter from `RUST_LOG`, falling back to `default_level`.
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
