//! Error types for the game layer.

use dropfour_protocol::{ClientId, MatchId, RejectReason};

/// A drop the board refused. The board is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DropError {
    /// Column index outside `[0, COLUMNS)`.
    #[error("column {0} does not exist")]
    InvalidColumn(i64),

    /// The column already holds `ROWS` pieces.
    #[error("column {0} is full")]
    ColumnFull(usize),
}

/// A match operation that was refused. The match is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error(transparent)]
    Drop(#[from] DropError),

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("match {0} is not in progress")]
    MatchNotInProgress(MatchId),

    /// Rematch asked for before the current game reached a result.
    #[error("match {0} is still in progress")]
    MatchStillInProgress(MatchId),

    #[error("your opponent has left match {0}")]
    OpponentGone(MatchId),

    #[error("client {0} is not part of match {1}")]
    NotAParticipant(ClientId, MatchId),
}

impl MatchError {
    /// The wire-level reason reported to the acting client.
    pub fn reason(&self) -> RejectReason {
        match self {
            Self::Drop(DropError::InvalidColumn(_)) => RejectReason::InvalidColumn,
            Self::Drop(DropError::ColumnFull(_)) => RejectReason::ColumnFull,
            Self::NotYourTurn => RejectReason::NotYourTurn,
            Self::MatchNotInProgress(_) => RejectReason::MatchNotInProgress,
            Self::MatchStillInProgress(_) => RejectReason::MatchStillInProgress,
            Self::OpponentGone(_) => RejectReason::OpponentGone,
            Self::NotAParticipant(..) => RejectReason::NotAParticipant,
        }
    }
}
