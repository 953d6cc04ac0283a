//! Matchmaking and match orchestration for dropfour.
//!
//! [`Master`] is the single owner of every piece of shared game state:
//! the [`Matchmaker`] queue, the live matches, and the [`Registry`] that
//! says where each client currently is. Transports talk to it through one
//! entry point, [`Master::handle`], passing a [`Signal`].
//!
//! In the server the master runs inside one Tokio task (see
//! [`spawn_master`]); connection handlers reach it through a cloneable
//! [`MasterHandle`], so signals are applied strictly one at a time.

mod actor;
mod error;
mod master;
mod matchmaker;
mod registry;
mod signal;

pub use actor::{ClientSender, MasterHandle, spawn_master};
pub use error::{LobbyError, MasterUnavailable};
pub use master::{LobbyStats, Master, Outbox};
pub use matchmaker::{Matchmaker, Pairing};
pub use registry::{ClientState, Registry};
pub use signal::Signal;
