//! Error types for the client.

use thiserror::Error;

/// Client error type.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Invalid command-line configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Logging could not be initialised
    #[error("Logging error: {0}")]
    Logging(#[from] observability::ObservabilityError),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
