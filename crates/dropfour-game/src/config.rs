//! Board dimensions and the match lifecycle state machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Board dimensions
// ---------------------------------------------------------------------------

/// Number of columns (board width).
pub const COLUMNS: usize = 7;

/// Number of rows (board height). Row 0 is the top row.
pub const ROWS: usize = 6;

/// Contiguous pieces needed to win.
pub const WIN_LENGTH: usize = 4;

// ---------------------------------------------------------------------------
// MatchState
// ---------------------------------------------------------------------------

/// The lifecycle state of a match.
///
/// ```text
///   AwaitingBoth ──→ InProgress ──→ Finished
///        │                ↑             │
///        │                └──(rematch)──┘
///        └──────(abandoned)──────→ Finished
/// ```
///
/// - **AwaitingBoth**: paired, but still waiting on a confirmation from one
///   of the participants. Pairs formed from two ready clients skip it.
/// - **InProgress**: moves are accepted from whoever holds the turn.
/// - **Finished**: a result is recorded (win, draw or abandonment). Only a
///   mutually agreed rematch leaves this state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchState {
    AwaitingBoth,
    InProgress,
    Finished,
}

impl MatchState {
    /// Returns `true` while the game has not reached a result.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::AwaitingBoth | Self::InProgress)
    }

    /// Returns `true` if moving to `target` is a legal transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::AwaitingBoth, Self::InProgress)
                | (Self::AwaitingBoth, Self::Finished)
                | (Self::InProgress, Self::Finished)
                | (Self::Finished, Self::InProgress)
        )
    }
}

impl std::fmt::Display for MatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitingBoth => write!(f, "AwaitingBoth"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
