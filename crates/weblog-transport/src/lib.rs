//! Stream connection to the remote log collector.
//!
//! A [`Transport`] is either connected or absent. Every failure, whether in
//! connect or in send, leaves it absent; the next [`Transport::ensure_connected`]
//! call opens a fresh connection. Nothing here retries or sleeps: the caller
//! decides when the next attempt happens.

mod error;
mod tcp;

pub use error::{TransportError, TransportResult};
pub use tcp::{ConnectionState, TcpTransport};

use async_trait::async_trait;

/// A single persistent byte stream to one remote endpoint.
#[async_trait]
pub trait Transport: Send {
    /// Whether a live connection is currently held.
    fn is_connected(&self) -> bool;

    /// Open a connection unless one is already held.
    ///
    /// On failure the transport stays absent; there is no retry within the call.
    async fn ensure_connected(&mut self) -> TransportResult<()>;

    /// Write all of `bytes` to the connection.
    ///
    /// Any write error closes the connection before the error is returned.
    async fn send(&mut self, bytes: &[u8]) -> TransportResult<()>;

    /// Close the connection, if any.
    async fn close(&mut self);
}
