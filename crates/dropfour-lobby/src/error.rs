//! Error types for the lobby layer.

use dropfour_game::MatchError;
use dropfour_protocol::{ClientId, RejectReason};

/// A signal the lobby refused.
///
/// Every variant is an expected, recoverable condition; the master turns
/// it into a `Rejected` notification for the acting client only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LobbyError {
    #[error("client {0} is already queued")]
    AlreadyQueued(ClientId),

    #[error("client {0} is already queued or playing")]
    AlreadyActive(ClientId),

    #[error("client {0} is not in a match")]
    NotInMatch(ClientId),

    #[error(transparent)]
    Match(#[from] MatchError),
}

impl LobbyError {
    /// The wire-level reason reported to the acting client.
    pub fn reason(&self) -> RejectReason {
        match self {
            Self::AlreadyQueued(_) => RejectReason::AlreadyQueued,
            Self::AlreadyActive(_) => RejectReason::AlreadyActive,
            Self::NotInMatch(_) => RejectReason::NotInMatch,
            Self::Match(e) => e.reason(),
        }
    }
}

/// The master actor has stopped and can no longer take commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("lobby master is not running")]
pub struct MasterUnavailable;
