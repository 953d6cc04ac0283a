//! Where each client is: nowhere, in the queue, or seated in a match.

use std::collections::HashMap;

use dropfour_protocol::{ClientId, MatchId, Slot};

/// A client's place in the lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Unregistered,
    Queued,
    InMatch { match_id: MatchId, slot: Slot },
}

/// The single source of truth for routing signals.
///
/// A client maps to exactly one [`ClientState`]; `Unregistered` is stored
/// as absence, so the map only ever holds clients with somewhere to be.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<ClientId, ClientState>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of `client`.
    pub fn state_of(&self, client: ClientId) -> ClientState {
        self.entries
            .get(&client)
            .copied()
            .unwrap_or(ClientState::Unregistered)
    }

    pub fn mark_queued(&mut self, client: ClientId) {
        self.entries.insert(client, ClientState::Queued);
    }

    pub fn mark_in_match(&mut self, client: ClientId, match_id: MatchId, slot: Slot) {
        self.entries
            .insert(client, ClientState::InMatch { match_id, slot });
    }

    /// Forgets `client`, returning what it was.
    pub fn clear(&mut self, client: ClientId) -> ClientState {
        self.entries
            .remove(&client)
            .unwrap_or(ClientState::Unregistered)
    }

    /// Clients currently waiting in the queue.
    pub fn queued_count(&self) -> usize {
        self.entries
            .values()
            .filter(|s| matches!(s, ClientState::Queued))
            .count()
    }

    /// Clients currently seated in a match.
    pub fn in_match_count(&self) -> usize {
        self.entries
            .values()
            .filter(|s| matches!(s, ClientState::InMatch { .. }))
            .count()
    }
}
