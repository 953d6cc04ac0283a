use std::io;
use std::net::SocketAddr;

use crate::ConnectionId;

/// Failures below the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("could not listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// The peer connected but the WebSocket upgrade did not complete.
    #[error("websocket handshake with {peer} failed: {reason}")]
    Handshake { peer: SocketAddr, reason: String },

    /// The connection is already closed; nothing more can be sent.
    #[error("connection {0} is closed")]
    Closed(ConnectionId),

    #[error("send on {id} failed: {reason}")]
    Send { id: ConnectionId, reason: String },

    #[error("receive on {id} failed: {reason}")]
    Receive { id: ConnectionId, reason: String },
}
