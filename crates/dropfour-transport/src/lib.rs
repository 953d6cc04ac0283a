//! Transport abstraction layer for dropfour.
//!
//! The lobby never sees sockets. A transport hands each accepted client a
//! [`ConnectionId`], and that number is the client's whole identity for
//! as long as the socket stays open.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{PendingWebSocket, WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::net::SocketAddr;

/// Per-transport connection number, starting at 1. Assigned when the
/// socket is accepted and never reused by the transport that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A listener that yields accepted, not yet upgraded, clients.
pub trait Transport: Send + Sync + 'static {
    type Pending: Handshake<Connection = Self::Connection, Error = Self::Error>;
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next socket. Does no protocol I/O, so it returns as
    /// soon as the peer connects.
    async fn accept(&mut self) -> Result<Self::Pending, Self::Error>;
}

/// An accepted socket whose protocol handshake has not run yet.
///
/// The handshake waits on the peer, so callers run it in the
/// per-connection task, usually under a timeout.
pub trait Handshake: Send + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    fn id(&self) -> ConnectionId;

    fn peer_addr(&self) -> SocketAddr;

    /// Completes the handshake and returns the usable connection.
    async fn upgrade(self) -> Result<Self::Connection, Self::Error>;
}

/// One client's message pipe.
///
/// `send` and `recv` must be usable concurrently from different tasks:
/// the server pushes notifications caused by the opponent while the
/// connection's own reader is parked in [`recv`](Connection::recv).
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Writes one whole message.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Reads the next whole message, or `Ok(None)` once the peer has
    /// closed cleanly.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Starts a clean close from this side.
    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}
