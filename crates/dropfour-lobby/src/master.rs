//! The match orchestrator.
//!
//! Synchronous state only. Nothing here blocks or awaits; the async actor
//! in [`crate::actor`] serializes calls and delivers the returned outbox.

use std::collections::HashMap;

use dropfour_game::{COLUMNS, Match, MoveOutcome, ROWS, RematchOutcome};
use dropfour_protocol::{ClientId, MatchId, MatchResult, ServerMessage, Slot};

use crate::{ClientState, LobbyError, Matchmaker, Pairing, Registry, Signal};

/// Notifications produced by one signal, in delivery order.
pub type Outbox = Vec<(ClientId, ServerMessage)>;

/// A point-in-time count of lobby occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LobbyStats {
    pub queued: usize,
    pub in_match: usize,
    pub live_matches: usize,
}

/// Owns the queue, every live match, and the client registry.
///
/// All mutation goes through [`Master::handle`] or the `on_*` operations,
/// one signal at a time.
#[derive(Debug, Default)]
pub struct Master {
    matchmaker: Matchmaker,
    matches: HashMap<MatchId, Match>,
    registry: Registry,
    next_match_id: u64,
}

impl Master {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes `signal` from `client` and returns who must be told what.
    ///
    /// A refused signal becomes a single `Rejected` addressed to `client`;
    /// no other participant hears about it.
    pub fn handle(&mut self, client: ClientId, signal: Signal) -> Outbox {
        let result = match signal {
            Signal::Ready => self.on_ready(client),
            Signal::Move { column } => self.on_move(client, column),
            Signal::Leave => self.on_leave(client),
            Signal::Rematch => self.on_rematch_request(client),
            Signal::Disconnect => self.on_disconnect(client),
        };

        match result {
            Ok(outbox) => outbox,
            Err(e) => {
                tracing::debug!(
                    %client,
                    signal = signal.name(),
                    reason = %e.reason(),
                    "signal rejected"
                );
                vec![(
                    client,
                    ServerMessage::Rejected {
                        reason: e.reason(),
                        message: e.to_string(),
                    },
                )]
            }
        }
    }

    /// Puts `client` in line, starting a match if someone was waiting.
    pub fn on_ready(&mut self, client: ClientId) -> Result<Outbox, LobbyError> {
        if self.registry.state_of(client) != ClientState::Unregistered {
            return Err(LobbyError::AlreadyActive(client));
        }

        match self.matchmaker.enqueue_ready(client)? {
            Pairing::Waiting => {
                self.registry.mark_queued(client);
                tracing::info!(
                    %client,
                    queued = self.matchmaker.len(),
                    "client queued"
                );
                Ok(vec![(client, ServerMessage::Queued)])
            }
            Pairing::PairFormed(first, second) => Ok(self.start_match(first, second)),
        }
    }

    /// Plays a piece for `client` in its current match.
    pub fn on_move(
        &mut self,
        client: ClientId,
        column: i64,
    ) -> Result<Outbox, LobbyError> {
        let match_id = self.current_match(client)?;
        let game = self.match_mut(match_id);
        let outcome = game.apply_move(client, column)?;

        tracing::debug!(
            %match_id,
            %client,
            slot = %outcome.slot,
            column = outcome.position.column,
            row = outcome.position.row,
            "move applied"
        );

        let game = self.match_ref(match_id);
        let mut outbox = broadcast(game, move_applied(&outcome));
        if let Some(result) = game.result() {
            tracing::info!(
                %match_id,
                ?result,
                moves = game.moves_played(),
                "match finished"
            );
            outbox.extend(broadcast(game, ServerMessage::MatchFinished { result }));
        }
        Ok(outbox)
    }

    /// Takes `client` out of the queue or its match.
    ///
    /// Accepted in any state; an unregistered client is a no-op.
    pub fn on_leave(&mut self, client: ClientId) -> Result<Outbox, LobbyError> {
        match self.registry.clear(client) {
            ClientState::Unregistered => Ok(Vec::new()),
            ClientState::Queued => {
                self.matchmaker.remove(client);
                tracing::info!(%client, "client left the queue");
                Ok(Vec::new())
            }
            ClientState::InMatch { match_id, slot } => {
                Ok(self.leave_match(client, match_id, slot))
            }
        }
    }

    /// Records `client`'s consent to play again.
    pub fn on_rematch_request(
        &mut self,
        client: ClientId,
    ) -> Result<Outbox, LobbyError> {
        let match_id = self.current_match(client)?;
        let game = self.match_mut(match_id);

        match game.request_rematch(client)? {
            RematchOutcome::Pending => {
                tracing::debug!(%match_id, %client, "rematch requested");
                Ok(Vec::new())
            }
            RematchOutcome::Started {
                opening_turn,
                epoch,
            } => {
                tracing::info!(%match_id, epoch, "rematch started");
                Ok(broadcast(
                    game,
                    ServerMessage::RematchStarted {
                        opening_turn,
                        epoch,
                    },
                ))
            }
        }
    }

    /// The connection is gone. Same bookkeeping as an explicit leave.
    pub fn on_disconnect(&mut self, client: ClientId) -> Result<Outbox, LobbyError> {
        tracing::debug!(%client, state = ?self.registry.state_of(client), "client disconnected");
        self.on_leave(client)
    }

    /// Where `client` currently is.
    pub fn client_state(&self, client: ClientId) -> ClientState {
        self.registry.state_of(client)
    }

    /// A live match by id.
    pub fn get_match(&self, match_id: MatchId) -> Option<&Match> {
        self.matches.get(&match_id)
    }

    pub fn stats(&self) -> LobbyStats {
        debug_assert_eq!(
            self.registry.queued_count(),
            self.matchmaker.len(),
            "registry and matchmaker disagree on who is queued"
        );
        LobbyStats {
            queued: self.matchmaker.len(),
            in_match: self.registry.in_match_count(),
            live_matches: self.matches.len(),
        }
    }

    fn start_match(&mut self, player1: ClientId, player2: ClientId) -> Outbox {
        self.next_match_id += 1;
        let match_id = MatchId(self.next_match_id);
        let game = Match::new(match_id, player1, player2);

        for slot in Slot::ALL {
            self.registry
                .mark_in_match(game.participant(slot), match_id, slot);
        }

        tracing::info!(
            %match_id,
            player1 = %player1,
            player2 = %player2,
            live_matches = self.matches.len() + 1,
            "match started"
        );

        let outbox = game
            .present_participants()
            .map(|(slot, client)| {
                (
                    client,
                    ServerMessage::MatchStart {
                        match_id,
                        slot,
                        columns: COLUMNS,
                        rows: ROWS,
                        opening_turn: game.current_turn(),
                    },
                )
            })
            .collect();

        self.matches.insert(match_id, game);
        outbox
    }

    fn leave_match(&mut self, client: ClientId, match_id: MatchId, slot: Slot) -> Outbox {
        let game = self.match_mut(match_id);
        let abandoned = game.mark_abandoned(slot);
        let empty = game.depart(slot);

        tracing::info!(%match_id, %client, %slot, abandoned, "client left match");

        let notice = if abandoned {
            ServerMessage::MatchFinished {
                result: MatchResult::Abandoned { by: slot },
            }
        } else {
            ServerMessage::OpponentLeft { slot }
        };
        let outbox = broadcast(game, notice);

        if empty {
            self.matches.remove(&match_id);
            tracing::info!(
                %match_id,
                live_matches = self.matches.len(),
                "match removed"
            );
        }
        outbox
    }

    fn current_match(&self, client: ClientId) -> Result<MatchId, LobbyError> {
        match self.registry.state_of(client) {
            ClientState::InMatch { match_id, .. } => Ok(match_id),
            _ => Err(LobbyError::NotInMatch(client)),
        }
    }

    // A registry entry always points at a live match; a miss is a bug in
    // this module, not a client error.
    fn match_ref(&self, match_id: MatchId) -> &Match {
        self.matches
            .get(&match_id)
            .unwrap_or_else(|| panic!("registry references missing match {match_id}"))
    }

    fn match_mut(&mut self, match_id: MatchId) -> &mut Match {
        self.matches
            .get_mut(&match_id)
            .unwrap_or_else(|| panic!("registry references missing match {match_id}"))
    }
}

/// Addresses `msg` to every participant still attached to `game`.
fn broadcast(game: &Match, msg: ServerMessage) -> Outbox {
    game.present_participants()
        .map(|(_, client)| (client, msg.clone()))
        .collect()
}

fn move_applied(outcome: &MoveOutcome) -> ServerMessage {
    ServerMessage::MoveApplied {
        slot: outcome.slot,
        column: outcome.position.column,
        row: outcome.position.row,
        next_turn: outcome.next_turn,
    }
}
