//! A single match: two participants, one board, turn order and result.

use dropfour_protocol::{ClientId, MatchId, MatchResult, Slot};

use crate::{Board, MatchError, MatchState, Position, TerminalStatus};

/// What an accepted move did, for broadcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub slot: Slot,
    pub position: Position,
    /// Who moves next, or `None` if this move finished the match.
    pub next_turn: Option<Slot>,
    pub terminal: TerminalStatus,
}

/// Result of a rematch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RematchOutcome {
    /// Recorded; the other participant has not asked yet.
    Pending,
    /// Both asked. The board is empty and `opening_turn` moves first.
    Started { opening_turn: Slot, epoch: u32 },
}

/// One game between two clients, including any rematches between them.
///
/// The match owns its board outright. Participants are referenced by id
/// only; the lobby resolves ids to connections.
#[derive(Debug, Clone)]
pub struct Match {
    id: MatchId,
    /// Indexed by [`Slot::index`].
    participants: [ClientId; 2],
    /// Cleared when a participant leaves or disconnects.
    present: [bool; 2],
    board: Board,
    state: MatchState,
    current_turn: Slot,
    result: Option<MatchResult>,
    rematch_requests: [bool; 2],
    epoch: u32,
    moves_played: u32,
}

impl Match {
    /// Player1 always opens, in the first game and in every rematch.
    pub const OPENING_TURN: Slot = Slot::Player1;

    /// Creates a match between two clients who are both already ready,
    /// so play starts immediately. `player1` opens.
    pub fn new(id: MatchId, player1: ClientId, player2: ClientId) -> Self {
        Self {
            id,
            participants: [player1, player2],
            present: [true, true],
            board: Board::new(),
            state: MatchState::InProgress,
            current_turn: Self::OPENING_TURN,
            result: None,
            rematch_requests: [false, false],
            epoch: 0,
            moves_played: 0,
        }
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn current_turn(&self) -> Slot {
        self.current_turn
    }

    pub fn result(&self) -> Option<MatchResult> {
        self.result
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Number of rematch resets so far.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Moves accepted in the current epoch.
    pub fn moves_played(&self) -> u32 {
        self.moves_played
    }

    /// The client seated in `slot`.
    pub fn participant(&self, slot: Slot) -> ClientId {
        self.participants[slot.index()]
    }

    /// The slot `client` occupies, if it is a participant.
    pub fn slot_of(&self, client: ClientId) -> Option<Slot> {
        Slot::ALL
            .into_iter()
            .find(|slot| self.participants[slot.index()] == client)
    }

    /// Returns `true` if the participant in `slot` has not left.
    pub fn is_present(&self, slot: Slot) -> bool {
        self.present[slot.index()]
    }

    /// Participants that are still attached, in seating order.
    pub fn present_participants(&self) -> impl Iterator<Item = (Slot, ClientId)> + '_ {
        Slot::ALL
            .into_iter()
            .filter(|slot| self.is_present(*slot))
            .map(|slot| (slot, self.participant(slot)))
    }

    /// Plays `client`'s piece into `column`.
    ///
    /// Checks run in a fixed order: participant, match state, turn, then
    /// the board. Once the match is finished every move, including one
    /// from the slot not on turn, fails with `MatchNotInProgress`.
    /// `NotYourTurn` is only reported while the match is in progress.
    ///
    /// On any error the match and its board are unchanged.
    pub fn apply_move(
        &mut self,
        client: ClientId,
        column: i64,
    ) -> Result<MoveOutcome, MatchError> {
        let slot = self.require_slot(client)?;
        if self.state != MatchState::InProgress {
            return Err(MatchError::MatchNotInProgress(self.id));
        }
        if slot != self.current_turn {
            return Err(MatchError::NotYourTurn);
        }

        let position = self.board.try_drop(column, slot)?;
        self.moves_played += 1;

        let terminal = self.board.evaluate_terminal(position);
        let next_turn = match terminal {
            TerminalStatus::Ongoing => {
                self.current_turn = slot.other();
                Some(self.current_turn)
            }
            TerminalStatus::Win(winner) => {
                self.finish(MatchResult::Win { slot: winner });
                None
            }
            TerminalStatus::Draw => {
                self.finish(MatchResult::Draw);
                None
            }
        };

        Ok(MoveOutcome {
            slot,
            position,
            next_turn,
            terminal,
        })
    }

    /// Ends the match because `by` walked away.
    ///
    /// Returns `true` if this call finished the match, `false` if it was
    /// already finished (the earlier result stands).
    pub fn mark_abandoned(&mut self, by: Slot) -> bool {
        if !self.state.is_open() {
            return false;
        }
        self.finish(MatchResult::Abandoned { by });
        true
    }

    /// Records that the participant in `slot` is gone for good.
    ///
    /// Returns `true` once neither participant remains, meaning the match
    /// can be dropped.
    pub fn depart(&mut self, slot: Slot) -> bool {
        self.present[slot.index()] = false;
        self.rematch_requests[slot.index()] = false;
        !self.present.iter().any(|p| *p)
    }

    /// Records `client`'s wish for another game.
    ///
    /// Once both participants have asked within the current epoch the
    /// board is cleared and Player1 opens the new game.
    pub fn request_rematch(
        &mut self,
        client: ClientId,
    ) -> Result<RematchOutcome, MatchError> {
        let slot = self.require_slot(client)?;
        if !self.is_present(slot.other()) {
            return Err(MatchError::OpponentGone(self.id));
        }
        if self.state.is_open() {
            return Err(MatchError::MatchStillInProgress(self.id));
        }

        self.rematch_requests[slot.index()] = true;
        if !self.rematch_requests.iter().all(|r| *r) {
            return Ok(RematchOutcome::Pending);
        }

        self.board.reset();
        self.rematch_requests = [false, false];
        self.current_turn = Self::OPENING_TURN;
        self.result = None;
        self.moves_played = 0;
        self.epoch += 1;
        self.transition(MatchState::InProgress);

        Ok(RematchOutcome::Started {
            opening_turn: self.current_turn,
            epoch: self.epoch,
        })
    }

    fn require_slot(&self, client: ClientId) -> Result<Slot, MatchError> {
        self.slot_of(client)
            .ok_or(MatchError::NotAParticipant(client, self.id))
    }

    fn finish(&mut self, result: MatchResult) {
        self.result = Some(result);
        self.transition(MatchState::Finished);
    }

    fn transition(&mut self, target: MatchState) {
        debug_assert!(
            self.state.can_transition_to(target),
            "illegal match transition {} -> {}",
            self.state,
            target
        );
        self.state = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{COLUMNS, DropError, ROWS};

    const A: ClientId = ClientId(1);
    const B: ClientId = ClientId(2);

    fn new_match() -> Match {
        Match::new(MatchId(1), A, B)
    }

    /// Plays alternating moves (A first) and returns the last outcome.
    fn play(m: &mut Match, columns: &[i64]) -> MoveOutcome {
        let mut last = None;
        for col in columns {
            let client = m.participant(m.current_turn());
            last = Some(m.apply_move(client, *col).unwrap());
        }
        last.expect("at least one move")
    }

    fn finish_with_win(m: &mut Match) {
        play(m, &[0, 6, 1, 6, 2, 6, 3]);
        assert_eq!(m.state(), MatchState::Finished);
    }

    #[test]
    fn test_new_match_starts_in_progress_with_player1() {
        let m = new_match();
        assert_eq!(m.state(), MatchState::InProgress);
        assert_eq!(m.current_turn(), Slot::Player1);
        assert_eq!(m.slot_of(A), Some(Slot::Player1));
        assert_eq!(m.slot_of(B), Some(Slot::Player2));
        assert_eq!(m.slot_of(ClientId(99)), None);
        assert!(m.result().is_none());
    }

    #[test]
    fn test_turn_alternates_after_each_move() {
        let mut m = new_match();
        let first = m.apply_move(A, 3).unwrap();
        assert_eq!(first.slot, Slot::Player1);
        assert_eq!(first.next_turn, Some(Slot::Player2));
        let second = m.apply_move(B, 3).unwrap();
        assert_eq!(second.next_turn, Some(Slot::Player1));
        assert_eq!(second.position, Position { row: 4, column: 3 });
        assert_eq!(m.moves_played(), 2);
    }

    #[test]
    fn test_out_of_turn_move_rejected_and_state_unchanged() {
        let mut m = new_match();
        m.apply_move(A, 3).unwrap();
        let before = m.board().clone();

        assert_eq!(m.apply_move(A, 3), Err(MatchError::NotYourTurn));
        assert_eq!(m.board(), &before);
        assert_eq!(m.current_turn(), Slot::Player2);
        assert_eq!(m.moves_played(), 1);
    }

    #[test]
    fn test_board_errors_propagate_without_flipping_turn() {
        let mut m = new_match();
        let err = m.apply_move(A, COLUMNS as i64).unwrap_err();
        assert_eq!(err, MatchError::Drop(DropError::InvalidColumn(7)));
        assert_eq!(m.current_turn(), Slot::Player1);

        play(&mut m, &[0, 0, 0, 0, 0, 0]);
        assert_eq!(m.board().fill_level(0), ROWS);
        let err = m.apply_move(A, 0).unwrap_err();
        assert_eq!(err, MatchError::Drop(DropError::ColumnFull(0)));
        assert_eq!(m.current_turn(), Slot::Player1);
    }

    #[test]
    fn test_non_participant_rejected() {
        let mut m = new_match();
        assert_eq!(
            m.apply_move(ClientId(7), 0),
            Err(MatchError::NotAParticipant(ClientId(7), MatchId(1)))
        );
    }

    #[test]
    fn test_winning_move_finishes_match() {
        let mut m = new_match();
        let last = play(&mut m, &[0, 6, 1, 6, 2, 6, 3]);
        assert_eq!(last.terminal, TerminalStatus::Win(Slot::Player1));
        assert_eq!(last.next_turn, None);
        assert_eq!(m.result(), Some(MatchResult::Win { slot: Slot::Player1 }));
        assert_eq!(m.state(), MatchState::Finished);
    }

    #[test]
    fn test_no_move_accepted_once_finished() {
        let mut m = new_match();
        finish_with_win(&mut m);
        assert_eq!(m.apply_move(B, 5), Err(MatchError::MatchNotInProgress(MatchId(1))));
        assert_eq!(m.apply_move(A, 5), Err(MatchError::MatchNotInProgress(MatchId(1))));
    }

    #[test]
    fn test_mark_abandoned_is_idempotent() {
        let mut m = new_match();
        assert!(m.mark_abandoned(Slot::Player1));
        let once = m.result();
        assert!(!m.mark_abandoned(Slot::Player1));
        assert_eq!(m.result(), once);
        assert_eq!(once, Some(MatchResult::Abandoned { by: Slot::Player1 }));
        assert_eq!(m.state(), MatchState::Finished);
    }

    #[test]
    fn test_mark_abandoned_keeps_earlier_win() {
        let mut m = new_match();
        finish_with_win(&mut m);
        assert!(!m.mark_abandoned(Slot::Player2));
        assert_eq!(m.result(), Some(MatchResult::Win { slot: Slot::Player1 }));
    }

    #[test]
    fn test_depart_reports_when_both_gone() {
        let mut m = new_match();
        assert!(!m.depart(Slot::Player1));
        assert!(!m.is_present(Slot::Player1));
        assert_eq!(
            m.present_participants().collect::<Vec<_>>(),
            vec![(Slot::Player2, B)]
        );
        assert!(m.depart(Slot::Player2));
    }

    #[test]
    fn test_single_rematch_request_is_pending() {
        let mut m = new_match();
        finish_with_win(&mut m);
        let before = m.board().clone();

        assert_eq!(m.request_rematch(B), Ok(RematchOutcome::Pending));
        assert_eq!(m.board(), &before);
        assert_eq!(m.state(), MatchState::Finished);

        // Asking twice from the same side is still pending.
        assert_eq!(m.request_rematch(B), Ok(RematchOutcome::Pending));
    }

    #[test]
    fn test_rematch_after_both_consent_resets_board() {
        let mut m = new_match();
        finish_with_win(&mut m);

        m.request_rematch(B).unwrap();
        let outcome = m.request_rematch(A).unwrap();
        assert_eq!(
            outcome,
            RematchOutcome::Started {
                opening_turn: Slot::Player1,
                epoch: 1
            }
        );
        assert_eq!(m.board().pieces(), 0);
        assert_eq!(m.state(), MatchState::InProgress);
        assert_eq!(m.current_turn(), Slot::Player1);
        assert!(m.result().is_none());
        assert_eq!(m.moves_played(), 0);

        // Consent does not carry into the next epoch.
        finish_with_win(&mut m);
        assert_eq!(m.request_rematch(A), Ok(RematchOutcome::Pending));
    }

    #[test]
    fn test_rematch_while_in_progress_rejected() {
        let mut m = new_match();
        assert_eq!(
            m.request_rematch(A),
            Err(MatchError::MatchStillInProgress(MatchId(1)))
        );
    }

    #[test]
    fn test_rematch_after_abandonment_reports_opponent_gone() {
        let mut m = new_match();
        m.mark_abandoned(Slot::Player2);
        m.depart(Slot::Player2);
        assert_eq!(m.request_rematch(A), Err(MatchError::OpponentGone(MatchId(1))));
    }

    #[test]
    fn test_error_reasons_map_to_wire() {
        use dropfour_protocol::RejectReason;
        assert_eq!(MatchError::NotYourTurn.reason(), RejectReason::NotYourTurn);
        assert_eq!(
            MatchError::Drop(DropError::ColumnFull(2)).reason(),
            RejectReason::ColumnFull
        );
        assert_eq!(
            MatchError::OpponentGone(MatchId(3)).reason(),
            RejectReason::OpponentGone
        );
    }
}
