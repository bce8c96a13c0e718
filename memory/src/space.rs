use std::sync::Arc;

use parking_lot::Mutex;

use crate::CellStatus;

/// A single cell of the board: either a hole or a [`Card`].
///
/// Cloning a `Space` is cheap. Clones of a card space share the same
/// [`Card`], so claiming through one clone is visible through all of them.
#[derive(Clone, Debug)]
pub enum Space {
    Empty { row: usize, col: usize },
    Card(Arc<Card>),
}

/// A card on the board, identified by its (1-based) coordinates.
///
/// The label and coordinates never change. The face and owner change
/// together under one short lock, which makes [`Card::claim()`] a single
/// test-and-set with respect to every other operation on this card.
#[derive(Debug)]
pub struct Card {
    row: usize,
    col: usize,
    label: String,
    state: Mutex<CardState>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct CardState {
    face_up: bool,
    owner: Option<String>,
}

impl Card {
    /// Creates a face-down, unowned card.
    pub fn new(label: impl Into<String>, row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            label: label.into(),
            state: Mutex::new(CardState::default()),
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_face_up(&self) -> bool {
        self.state.lock().face_up
    }

    pub fn owner(&self) -> Option<String> {
        self.state.lock().owner.clone()
    }

    pub fn has_owner(&self) -> bool {
        self.state.lock().owner.is_some()
    }

    /// Takes control of the card for `player` and turns it face up.
    ///
    /// Fails without any effect if somebody (including `player`) already
    /// controls the card.
    pub fn claim(&self, player: &str) -> bool {
        let mut state = self.state.lock();
        if state.owner.is_some() {
            return false;
        }
        state.owner = Some(String::from(player));
        state.face_up = true;
        true
    }

    /// Gives up control of the card. The face is left as it is.
    pub fn release(&self) {
        self.state.lock().owner = None;
    }

    /// Turns the card face down, unless somebody controls it.
    ///
    /// Returns true if the card is face down afterwards.
    pub fn put_face_down(&self) -> bool {
        let mut state = self.state.lock();
        if state.owner.is_none() {
            state.face_up = false;
        }
        !state.face_up
    }

    /// How this card looks to `viewer`, read under a single lock.
    pub fn status_for(&self, viewer: &str) -> CellStatus {
        let state = self.state.lock();
        match (&state.owner, state.face_up) {
            (Some(owner), _) if owner == viewer => CellStatus::Mine(self.label.clone()),
            (_, true) => CellStatus::Up(self.label.clone()),
            (_, false) => CellStatus::Down,
        }
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} : ({}, {})", self.label, self.row, self.col)
    }
}

impl Space {
    /// The sentinel stored in a ledger slot that holds nothing.
    pub const NOTHING: Space = Space::Empty { row: 0, col: 0 };

    /// Creates a new face-down card space.
    pub fn card(label: impl Into<String>, row: usize, col: usize) -> Self {
        Space::Card(Arc::new(Card::new(label, row, col)))
    }

    pub fn row(&self) -> usize {
        match self {
            Space::Empty { row, .. } => *row,
            Space::Card(card) => card.row(),
        }
    }

    pub fn col(&self) -> usize {
        match self {
            Space::Empty { col, .. } => *col,
            Space::Card(card) => card.col(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Space::Empty { .. })
    }

    pub fn is_face_up(&self) -> bool {
        match self {
            Space::Empty { .. } => false,
            Space::Card(card) => card.is_face_up(),
        }
    }

    /// The label to compare when matching. `None` for empty spaces, which
    /// match nothing.
    pub fn label(&self) -> Option<&str> {
        match self {
            Space::Empty { .. } => None,
            Space::Card(card) => Some(card.label()),
        }
    }

    pub fn owner(&self) -> Option<String> {
        match self {
            Space::Empty { .. } => None,
            Space::Card(card) => card.owner(),
        }
    }

    /// True iff both spaces are cards with equal labels.
    ///
    /// Empty spaces never match, so two holes are never "removed" as a pair.
    pub fn matches(&self, other: &Space) -> bool {
        match (self.label(), other.label()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// True iff both spaces are the very same card.
    pub fn is_same_card(&self, other: &Space) -> bool {
        match (self, other) {
            (Space::Card(a), Space::Card(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// See [`Card::claim()`]. Always fails for empty spaces.
    pub fn claim(&self, player: &str) -> bool {
        match self {
            Space::Empty { .. } => false,
            Space::Card(card) => card.claim(player),
        }
    }

    pub fn release(&self) {
        if let Space::Card(card) = self {
            card.release();
        }
    }

    /// See [`Card::put_face_down()`]. Empty spaces return false, there is
    /// no card to turn.
    pub fn put_face_down(&self) -> bool {
        match self {
            Space::Empty { .. } => false,
            Space::Card(card) => card.put_face_down(),
        }
    }

    pub fn status_for(&self, viewer: &str) -> CellStatus {
        match self {
            Space::Empty { .. } => CellStatus::None,
            Space::Card(card) => card.status_for(viewer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER: &str = "Player 1";
    const PLAYER2: &str = "Player 2";

    #[test]
    fn claim_turns_card_face_up() {
        let card = Card::new("A", 1, 1);
        assert!(!card.is_face_up());
        assert!(card.claim(PLAYER));
        assert!(card.is_face_up());
        assert_eq!(card.owner().as_deref(), Some(PLAYER));
    }

    #[test]
    fn claim_fails_when_controlled() {
        let card = Card::new("A", 1, 1);
        assert!(card.claim(PLAYER2));
        assert!(!card.claim(PLAYER));
        assert!(!card.claim(PLAYER2), "the owner cannot claim twice");
        assert_eq!(card.owner().as_deref(), Some(PLAYER2));
    }

    #[test]
    fn claim_after_release_keeps_face_up() {
        let card = Card::new("A", 1, 1);
        card.claim(PLAYER);
        card.release();
        assert!(card.is_face_up());
        assert!(card.claim(PLAYER2));
        assert_eq!(card.owner().as_deref(), Some(PLAYER2));
    }

    #[test]
    fn put_face_down_respects_owner() {
        let card = Card::new("A", 1, 1);
        assert!(card.put_face_down(), "a fresh card is face down");
        card.claim(PLAYER2);
        assert!(!card.put_face_down());
        assert!(card.is_face_up());
        card.release();
        assert!(card.put_face_down());
        assert!(!card.is_face_up());
    }

    #[test]
    fn release_is_idempotent() {
        let card = Card::new("A", 1, 1);
        card.release();
        assert!(!card.has_owner());
        card.claim(PLAYER);
        card.release();
        card.release();
        assert!(!card.has_owner());
    }

    #[test]
    fn empty_space_never_claims_or_matches() {
        let empty = Space::Empty { row: 2, col: 3 };
        assert!(!empty.claim(PLAYER));
        assert!(!empty.is_face_up());
        assert!(!empty.put_face_down());
        assert_eq!(empty.owner(), None);
        assert!(!empty.matches(&Space::Empty { row: 1, col: 1 }));
        assert!(!empty.matches(&Space::card("A", 1, 1)));
        assert_eq!((empty.row(), empty.col()), (2, 3));
    }

    #[test]
    fn matching_compares_labels() {
        let a1 = Space::card("\u{00A9}", 1, 1);
        let a2 = Space::card("\u{00A9}", 1, 2);
        let b = Space::card("\u{1F601}", 2, 1);
        assert!(a1.matches(&a2));
        assert!(!a1.matches(&b));
        assert!(!a1.is_same_card(&a2));
        assert!(a1.is_same_card(&a1.clone()));
    }

    #[test]
    fn status_depends_on_viewer() {
        let space = Space::card("A", 1, 1);
        assert_eq!(space.status_for(PLAYER), CellStatus::Down);
        space.claim(PLAYER);
        assert_eq!(space.status_for(PLAYER), CellStatus::Mine(String::from("A")));
        assert_eq!(space.status_for(PLAYER2), CellStatus::Up(String::from("A")));
        space.release();
        assert_eq!(space.status_for(PLAYER), CellStatus::Up(String::from("A")));
    }

    #[test]
    fn display() {
        assert_eq!(Card::new("A", 1, 1).to_string(), "A : (1, 1)");
    }

    #[test]
    fn concurrent_claims_have_one_winner() {
        let card = Card::new("A", 1, 1);
        let players: Vec<String> = (0..16).map(|i| format!("p{}", i)).collect();
        let barrier = std::sync::Barrier::new(players.len());
        let wins: usize = std::thread::scope(|s| {
            let handles: Vec<_> = players
                .iter()
                .map(|p| {
                    let card = &card;
                    let barrier = &barrier;
                    s.spawn(move || {
                        barrier.wait();
                        card.claim(p) as usize
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(wins, 1);
    }
}
