//! FIFO matchmaking queue.

use std::collections::VecDeque;

use dropfour_protocol::ClientId;

use crate::LobbyError;

/// What happened when a client joined the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    /// Not enough clients yet.
    Waiting,
    /// The two longest-waiting clients, oldest first.
    PairFormed(ClientId, ClientId),
}

/// Clients who are ready but not yet matched, oldest first.
///
/// Strictly first-ready, first-paired. There is no priority or
/// randomness, so pairing order is reproducible in tests.
#[derive(Debug, Default)]
pub struct Matchmaker {
    queue: VecDeque<ClientId>,
}

impl Matchmaker {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `client` and pairs the two oldest entries if possible.
    ///
    /// # Errors
    /// [`LobbyError::AlreadyQueued`] if `client` is already waiting.
    pub fn enqueue_ready(
        &mut self,
        client: ClientId,
    ) -> Result<Pairing, LobbyError> {
        if self.contains(client) {
            return Err(LobbyError::AlreadyQueued(client));
        }
        self.queue.push_back(client);

        if self.queue.len() >= 2 {
            if let (Some(first), Some(second)) =
                (self.queue.pop_front(), self.queue.pop_front())
            {
                return Ok(Pairing::PairFormed(first, second));
            }
        }
        Ok(Pairing::Waiting)
    }

    /// Removes `client` if it is waiting. Returns whether it was.
    pub fn remove(&mut self, client: ClientId) -> bool {
        match self.position(client) {
            Some(index) => {
                self.queue.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if `client` is waiting.
    pub fn contains(&self, client: ClientId) -> bool {
        self.queue.contains(&client)
    }

    /// Zero-based place in line.
    pub fn position(&self, client: ClientId) -> Option<usize> {
        self.queue.iter().position(|c| *c == client)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(id: u64) -> ClientId {
        ClientId(id)
    }

    #[test]
    fn test_single_client_waits() {
        let mut mm = Matchmaker::new();
        assert_eq!(mm.enqueue_ready(cid(1)), Ok(Pairing::Waiting));
        assert_eq!(mm.len(), 1);
        assert_eq!(mm.position(cid(1)), Some(0));
    }

    #[test]
    fn test_second_client_forms_pair_oldest_first() {
        let mut mm = Matchmaker::new();
        mm.enqueue_ready(cid(1)).unwrap();
        assert_eq!(
            mm.enqueue_ready(cid(2)),
            Ok(Pairing::PairFormed(cid(1), cid(2)))
        );
        assert!(mm.is_empty());
    }

    #[test]
    fn test_pairs_follow_arrival_order() {
        let mut mm = Matchmaker::new();
        let pairs: Vec<Pairing> =
            (1..=6).map(|i| mm.enqueue_ready(cid(i)).unwrap()).collect();
        assert_eq!(
            pairs,
            vec![
                Pairing::Waiting,
                Pairing::PairFormed(cid(1), cid(2)),
                Pairing::Waiting,
                Pairing::PairFormed(cid(3), cid(4)),
                Pairing::Waiting,
                Pairing::PairFormed(cid(5), cid(6)),
            ]
        );
    }

    #[test]
    fn test_duplicate_enqueue_rejected() {
        let mut mm = Matchmaker::new();
        mm.enqueue_ready(cid(1)).unwrap();
        assert_eq!(
            mm.enqueue_ready(cid(1)),
            Err(LobbyError::AlreadyQueued(cid(1)))
        );
        assert_eq!(mm.len(), 1);
    }

    #[test]
    fn test_removed_client_is_skipped_by_pairing() {
        let mut mm = Matchmaker::new();
        mm.enqueue_ready(cid(1)).unwrap();
        assert!(mm.remove(cid(1)));
        assert!(!mm.remove(cid(1)));
        assert_eq!(mm.enqueue_ready(cid(2)), Ok(Pairing::Waiting));
        assert_eq!(
            mm.enqueue_ready(cid(3)),
            Ok(Pairing::PairFormed(cid(2), cid(3)))
        );
    }
}
