//! # dropfour
//!
//! A real-time two-player drop-column game server.
//!
//! Clients connect over WebSocket, declare that they are ready, and are
//! paired first-come first-served into matches on a 7×6 board. The server
//! is authoritative: it enforces turn order, rejects illegal drops, detects
//! four in a row or a full board, and handles leaves, disconnects and
//! rematches.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dropfour::prelude::*;
//!
//! # async fn start() -> Result<(), DropfourError> {
//! let server = DropfourServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::DropfourError;
pub use server::{DropfourServer, DropfourServerBuilder, ServerConfig};

/// The types most servers and tests need, in one import.
pub mod prelude {
    pub use crate::{DropfourError, DropfourServer, DropfourServerBuilder, ServerConfig};
    pub use dropfour_game::{Board, COLUMNS, Match, MatchState, ROWS, WIN_LENGTH};
    pub use dropfour_lobby::{LobbyStats, Master, MasterHandle, Signal};
    pub use dropfour_protocol::{
        ClientId, ClientMessage, Codec, Envelope, JsonCodec, MatchId, MatchResult,
        RejectReason, ServerMessage, Slot,
    };
}
