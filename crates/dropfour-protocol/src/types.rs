//! Core protocol types for dropfour's wire format.
//!
//! Everything in this module travels between browser and server: the
//! identifiers, the slot and result vocabulary of a match, the messages a
//! client may send, the notifications the server pushes, and the
//! [`Envelope`] that frames each of them.

use std::fmt;

use dropfour_transport::ConnectionId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies one connected client.
///
/// Derived from the transport's [`ConnectionId`]; there is no other notion
/// of identity. Serializes as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

impl From<ConnectionId> for ClientId {
    fn from(id: ConnectionId) -> Self {
        Self(id.into_inner())
    }
}

/// Identifies one live match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Slot and result
// ---------------------------------------------------------------------------

/// A match-scoped role. Fixed for the lifetime of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Player1,
    Player2,
}

impl Slot {
    /// Both slots, in seating order.
    pub const ALL: [Slot; 2] = [Slot::Player1, Slot::Player2];

    /// Returns the opposing slot.
    pub fn other(self) -> Self {
        match self {
            Self::Player1 => Self::Player2,
            Self::Player2 => Self::Player1,
        }
    }

    /// Zero-based seat index, for indexing per-slot arrays.
    pub fn index(self) -> usize {
        match self {
            Self::Player1 => 0,
            Self::Player2 => 1,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player1 => write!(f, "Player1"),
            Self::Player2 => write!(f, "Player2"),
        }
    }
}

/// How a finished match ended.
///
/// Internally tagged so the browser sees
/// `{"outcome":"Win","slot":"Player1"}` or `{"outcome":"Draw"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome")]
pub enum MatchResult {
    /// The slot completed a line of four.
    Win { slot: Slot },
    /// Every column filled without a line of four.
    Draw,
    /// The slot left or disconnected before the game ended.
    Abandoned { by: Slot },
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Why a client's message was refused.
///
/// Sent inside [`ServerMessage::Rejected`] to the acting client only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    AlreadyQueued,
    AlreadyActive,
    NotInMatch,
    InvalidColumn,
    ColumnFull,
    NotYourTurn,
    MatchNotInProgress,
    MatchStillInProgress,
    OpponentGone,
    NotAParticipant,
    /// The frame could not be decoded.
    Malformed,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Messages a client sends.
///
/// `#[serde(tag = "type")]` gives `{"type":"Move","column":3}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Put me in the matchmaking queue.
    Ready,

    /// Drop a piece into `column`.
    ///
    /// Signed so that out-of-range values from the browser reach the game
    /// rules and get a proper `InvalidColumn` rejection.
    Move { column: i64 },

    /// Leave the queue or the current match.
    Leave,

    /// Ask for another game against the same opponent.
    Rematch,

    /// Keep-alive. Answered with [`ServerMessage::HeartbeatAck`].
    Heartbeat { client_time: u64 },
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Notifications the server pushes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// First frame on every connection.
    Welcome { client_id: ClientId, server_time: u64 },

    /// Reply to a heartbeat; `client_time` is echoed for RTT measurement.
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// Ready acknowledged; waiting for an opponent.
    Queued,

    /// A match was formed. Each participant gets its own `slot`.
    MatchStart {
        match_id: MatchId,
        slot: Slot,
        columns: usize,
        rows: usize,
        opening_turn: Slot,
    },

    /// A piece landed. `next_turn` is `None` when this move ended the game;
    /// a [`ServerMessage::MatchFinished`] follows.
    MoveApplied {
        slot: Slot,
        column: usize,
        row: usize,
        next_turn: Option<Slot>,
    },

    /// The match reached a terminal result.
    MatchFinished { result: MatchResult },

    /// Both participants asked for a rematch; the board is empty again.
    RematchStarted { opening_turn: Slot, epoch: u32 },

    /// The opponent left a match that had already finished.
    OpponentLeft { slot: Slot },

    /// The client's last message was refused. Nothing changed.
    Rejected { reason: RejectReason, message: String },
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Frame wrapper for every message on the wire.
///
/// ```text
/// { "seq": 4, "timestamp": 1520, "payload": { "type": "Queued" } }
/// ```
///
/// Each side keeps its own `seq` counter. `timestamp` is milliseconds since
/// the sender's connection started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub seq: u64,
    pub timestamp: u64,
    pub payload: T,
}
