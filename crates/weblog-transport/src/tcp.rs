//! TCP transport.

use crate::{Transport, TransportError, TransportResult};
use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpSocket, TcpStream};
use tracing::{debug, info, warn};

/// Connection state of a [`TcpTransport`].
#[derive(Debug, Default)]
pub enum ConnectionState {
    /// A live stream to the collector.
    Connected(TcpStream),
    /// No connection held.
    #[default]
    Absent,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }
}

/// Persistent TCP connection to a fixed collector address.
#[derive(Debug)]
pub struct TcpTransport {
    remote: SocketAddr,
    state: ConnectionState,
}

impl TcpTransport {
    /// Create an absent transport for `remote`. No I/O happens until
    /// [`Transport::ensure_connected`].
    pub fn new(remote: SocketAddr) -> Self {
        Self {
            remote,
            state: ConnectionState::Absent,
        }
    }

    /// Get the collector address.
    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    /// Get the current connection state.
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    fn teardown(&mut self) {
        if self.state.is_connected() {
            debug!(remote = %self.remote, "Dropping connection");
        }
        self.state = ConnectionState::Absent;
    }
}

#[async_trait]
impl Transport for TcpTransport {
    fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    async fn ensure_connected(&mut self) -> TransportResult<()> {
        if self.state.is_connected() {
            return Ok(());
        }

        let socket = open_socket(self.remote)?;
        let stream = socket
            .connect(self.remote)
            .await
            .map_err(|source| TransportError::Connect {
                addr: self.remote,
                source,
            })?;

        info!(remote = %self.remote, "Connected to log server");
        self.state = ConnectionState::Connected(stream);
        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> TransportResult<()> {
        let ConnectionState::Connected(stream) = &mut self.state else {
            return Err(TransportError::NotConnected);
        };

        // write_all resumes after short writes; only an error aborts
        let result = stream.write_all(bytes).await;
        if let Err(source) = result {
            self.teardown();
            return Err(TransportError::Send {
                addr: self.remote,
                source,
            });
        }

        Ok(())
    }

    async fn close(&mut self) {
        if let ConnectionState::Connected(stream) = &mut self.state {
            if let Err(e) = stream.shutdown().await {
                debug!(remote = %self.remote, error = %e, "Shutdown of connection failed");
            }
        }
        self.teardown();
    }
}

/// Create an unconnected stream socket for `remote`'s address family.
///
/// `IPV6_V6ONLY` and `SO_REUSEADDR` are best-effort.
fn open_socket(remote: SocketAddr) -> TransportResult<TcpSocket> {
    let socket = Socket::new(Domain::for_address(remote), Type::STREAM, Some(Protocol::TCP))
        .map_err(TransportError::Socket)?;

    if remote.is_ipv6() {
        if let Err(e) = socket.set_only_v6(true) {
            warn!(error = %e, "Failed to set IPV6_V6ONLY on socket");
        }
    }

    if let Err(e) = socket.set_reuse_address(true) {
        warn!(error = %e, "Failed to set SO_REUSEADDR on socket");
    }

    socket.set_nonblocking(true).map_err(TransportError::Socket)?;

    let std_stream: std::net::TcpStream = socket.into();
    Ok(TcpSocket::from_std_stream(std_stream))
}
