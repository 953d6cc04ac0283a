//! Inbound signals: the closed set of things a client can ask for.

use dropfour_protocol::ClientMessage;

/// Something a client did, as far as the lobby is concerned.
///
/// `Disconnect` never arrives over the wire; the transport raises it when
/// a connection goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Ready,
    Move { column: i64 },
    Leave,
    Rematch,
    Disconnect,
}

impl Signal {
    /// Maps a decoded client message to a signal.
    ///
    /// Returns `None` for messages the connection handler answers itself
    /// (heartbeats).
    pub fn from_client_message(msg: &ClientMessage) -> Option<Self> {
        match msg {
            ClientMessage::Ready => Some(Self::Ready),
            ClientMessage::Move { column } => Some(Self::Move { column: *column }),
            ClientMessage::Leave => Some(Self::Leave),
            ClientMessage::Rematch => Some(Self::Rematch),
            ClientMessage::Heartbeat { .. } => None,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Move { .. } => "move",
            Self::Leave => "leave",
            Self::Rematch => "rematch",
            Self::Disconnect => "disconnect",
        }
    }
}
