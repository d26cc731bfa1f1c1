//! Transport error types.

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Transport error type.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Socket creation failed
    #[error("Socket error: {0}")]
    Socket(#[source] io::Error),

    /// Connect to the collector failed
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Write to an established connection failed
    #[error("Failed to send to {addr}: {source}")]
    Send {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Send attempted without a connection
    #[error("Not connected")]
    NotConnected,
}

/// Result type alias using TransportError.
pub type TransportResult<T> = Result<T, TransportError>;
