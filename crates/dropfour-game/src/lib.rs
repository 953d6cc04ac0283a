//! Game rules for dropfour.
//!
//! Two layers, both free of I/O:
//!
//! - [`Board`]: a 7×6 grid with gravity drops and four-in-a-row detection.
//! - [`Match`]: one board plus two participants, turn order, lifecycle
//!   ([`MatchState`]), terminal result and rematch consent.
//!
//! Nothing here knows about queues, registries or sockets; the lobby crate
//! owns matches and routes client signals to them.

mod board;
mod config;
mod error;
mod game;

pub use board::{Board, Cell, Position, TerminalStatus};
pub use config::{COLUMNS, MatchState, ROWS, WIN_LENGTH};
pub use error::{DropError, MatchError};
pub use game::{Match, MoveOutcome, RematchOutcome};
