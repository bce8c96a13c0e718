use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::Space;

/// The (up to) two spaces a player currently controls.
///
/// Unused slots hold [`Space::NOTHING`]. The first slot is always filled
/// before the second one.
#[derive(Clone, Debug)]
pub struct Holdings {
    pub first: Space,
    pub second: Space,
}

impl Holdings {
    pub fn new() -> Self {
        Self {
            first: Space::NOTHING,
            second: Space::NOTHING,
        }
    }

    pub fn len(&self) -> usize {
        usize::from(!self.first.is_empty()) + usize::from(!self.second.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, space: &Space) -> bool {
        self.first.is_same_card(space) || self.second.is_same_card(space)
    }

    /// Puts `space` into the first free slot.
    ///
    /// Gives the space back if both slots are taken.
    pub fn push(&mut self, space: Space) -> Result<(), Space> {
        if self.first.is_empty() {
            self.first = space;
            Ok(())
        } else if self.second.is_empty() {
            self.second = space;
            Ok(())
        } else {
            Err(space)
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Default for Holdings {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps player ids to what they hold.
///
/// Each entry sits behind its own lock. [`Board::flip()`](crate::Board::flip)
/// holds that lock for a whole turn, so concurrent requests by the same
/// player are serialized while different players never wait for each other.
#[derive(Debug, Default)]
pub struct PlayerLedger {
    players: RwLock<HashMap<String, Arc<Mutex<Holdings>>>>,
}

impl PlayerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a player holding nothing. Returns false, and changes nothing,
    /// if the id is already registered.
    pub fn register(&self, player: &str) -> bool {
        if self.players.read().contains_key(player) {
            return false;
        }
        let mut players = self.players.write();
        if players.contains_key(player) {
            return false;
        }
        players.insert(String::from(player), Arc::new(Mutex::new(Holdings::new())));
        true
    }

    pub fn is_registered(&self, player: &str) -> bool {
        self.players.read().contains_key(player)
    }

    pub fn len(&self) -> usize {
        self.players.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn player_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.players.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn holdings_of(&self, player: &str) -> Option<Holdings> {
        self.entry(player).map(|entry| entry.lock().clone())
    }

    /// Replaces both slots at once. Returns false for unknown players.
    pub fn set_holdings(&self, player: &str, first: Space, second: Space) -> bool {
        match self.entry(player) {
            Some(entry) => {
                *entry.lock() = Holdings { first, second };
                true
            }
            None => false,
        }
    }

    /// Copies of everybody's holdings, sorted by player id.
    ///
    /// Each entry is copied under its own lock, so the result is only a
    /// consistent picture when no turns are in progress.
    pub fn snapshot(&self) -> Vec<(String, Holdings)> {
        let entries: Vec<(String, Arc<Mutex<Holdings>>)> = self
            .players
            .read()
            .iter()
            .map(|(id, entry)| (id.clone(), Arc::clone(entry)))
            .collect();
        let mut snapshot: Vec<(String, Holdings)> = entries
            .into_iter()
            .map(|(id, entry)| {
                let holdings = entry.lock().clone();
                (id, holdings)
            })
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot
    }

    /// The lock guarding one player's holdings.
    pub(crate) fn entry(&self, player: &str) -> Option<Arc<Mutex<Holdings>>> {
        self.players.read().get(player).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent() {
        let ledger = PlayerLedger::new();
        assert!(ledger.register("alice"));
        assert!(!ledger.register("alice"));
        assert!(ledger.register("bob"));
        assert_eq!(ledger.player_ids(), vec!["alice", "bob"]);
    }

    #[test]
    fn re_registering_keeps_holdings() {
        let ledger = PlayerLedger::new();
        ledger.register("alice");
        let card = Space::card("A", 1, 1);
        assert!(ledger.set_holdings("alice", card.clone(), Space::NOTHING));
        assert!(!ledger.register("alice"));
        let holdings = ledger.holdings_of("alice").unwrap();
        assert!(holdings.first.is_same_card(&card));
        assert_eq!(holdings.len(), 1);
    }

    #[test]
    fn unknown_players() {
        let ledger = PlayerLedger::new();
        assert!(ledger.holdings_of("nobody").is_none());
        assert!(!ledger.set_holdings("nobody", Space::NOTHING, Space::NOTHING));
        assert!(!ledger.is_registered("nobody"));
    }

    #[test]
    fn push_fills_first_slot_first() {
        let mut holdings = Holdings::new();
        assert!(holdings.is_empty());
        let a = Space::card("A", 1, 1);
        let b = Space::card("B", 1, 2);
        holdings.push(a.clone()).unwrap();
        holdings.push(b.clone()).unwrap();
        assert!(holdings.first.is_same_card(&a));
        assert!(holdings.second.is_same_card(&b));
        assert!(holdings.contains(&b));
        let c = Space::card("C", 2, 2);
        assert!(holdings.push(c.clone()).unwrap_err().is_same_card(&c));
        holdings.clear();
        assert_eq!(holdings.len(), 0);
    }

    #[test]
    fn snapshot_is_sorted() {
        let ledger = PlayerLedger::new();
        ledger.register("zoe");
        ledger.register("adam");
        ledger.set_holdings("zoe", Space::card("Z", 1, 1), Space::NOTHING);
        let snapshot = ledger.snapshot();
        let ids: Vec<&str> = snapshot.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["adam", "zoe"]);
        assert!(snapshot[0].1.is_empty());
        assert_eq!(snapshot[1].1.len(), 1);
    }

    #[test]
    fn concurrent_registration_has_one_winner() {
        let ledger = PlayerLedger::new();
        let wins: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| ledger.register("same") as usize))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(wins, 1);
        assert_eq!(ledger.len(), 1);
    }
}
