//! Wire protocol for dropfour.
//!
//! This crate defines what browser and server say to each other:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`Envelope`], the
//!   [`ClientId`]/[`MatchId`] identifiers and the [`Slot`] vocabulary).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how envelopes become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Lobby (signals)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientId, ClientMessage, Envelope, MatchId, MatchResult, RejectReason,
    ServerMessage, Slot,
};
