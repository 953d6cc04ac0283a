//! Unified error type for the dropfour server.

use std::net::SocketAddr;

use dropfour_lobby::MasterUnavailable;
use dropfour_protocol::ProtocolError;
use dropfour_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DropfourError {
    /// Connection, send or receive failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encode or decode failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The peer connected but did not finish the WebSocket upgrade in time.
    #[error("websocket upgrade from {0} timed out")]
    HandshakeTimeout(SocketAddr),

    /// The master actor is gone.
    #[error(transparent)]
    MasterUnavailable(#[from] MasterUnavailable),

    /// Invalid server configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}
