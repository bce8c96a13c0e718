use std::collections::{BTreeMap, BTreeSet};

use memory::{BoardState, CellStatus};

use crate::Bot;

/// What a player has seen of the board so far.
///
/// Cards never move, so a label seen once stays valid until the card is
/// removed. This can be automatically updated by implementing
/// [`HasCardMemory`] for your bot and wrapping it in a [`MemoryWrapper`].
#[derive(Clone, Debug, Default)]
pub struct CardMemory {
    /// Labels of cards seen face up, by 1-based coordinates.
    pub seen: BTreeMap<(usize, usize), String>,
    /// Spaces known to be empty.
    pub removed: BTreeSet<(usize, usize)>,
}

impl CardMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remembers every face-up label and forgets removed cards.
    pub fn observe(&mut self, state: &BoardState) {
        for (row, col, cell) in state.iter() {
            match cell {
                CellStatus::None => {
                    self.seen.remove(&(row, col));
                    self.removed.insert((row, col));
                }
                CellStatus::Down => {}
                CellStatus::Up(label) | CellStatus::Mine(label) => {
                    self.seen.insert((row, col), label.clone());
                }
            }
        }
    }

    pub fn label_at(&self, row: usize, col: usize) -> Option<&str> {
        self.seen.get(&(row, col)).map(String::as_str)
    }

    /// Another remembered card with the same label as the one at `(row, col)`.
    pub fn match_for(&self, row: usize, col: usize) -> Option<(usize, usize)> {
        let label = self.label_at(row, col)?;
        self.seen
            .iter()
            .find(|(pos, other)| **pos != (row, col) && other.as_str() == label)
            .map(|(&pos, _)| pos)
    }

    /// Two remembered cards with the same label, if any.
    pub fn known_pair(&self) -> Option<[(usize, usize); 2]> {
        self.seen
            .keys()
            .find_map(|&(row, col)| self.match_for(row, col).map(|other| [(row, col), other]))
    }

    /// Whether the card at `(row, col)` was never seen face up.
    pub fn is_unknown(&self, row: usize, col: usize) -> bool {
        !self.seen.contains_key(&(row, col)) && !self.removed.contains(&(row, col))
    }
}

/// Implement this trait on your bot to allow it to be used with a [`MemoryWrapper`].
///
/// Basically the same as `DerefMut<Target=CardMemory>`
pub trait HasCardMemory {
    fn get_memory(&mut self) -> &mut CardMemory;
}

/// Automatically remembers cards for your bot.
pub struct MemoryWrapper<T>
where
    T: HasCardMemory,
{
    bot: T,
}

impl<T> MemoryWrapper<T>
where
    T: HasCardMemory,
{
    pub fn new(bot: T) -> Self {
        Self { bot }
    }

    pub fn into_inner(self) -> T {
        self.bot
    }
}

impl<T: HasCardMemory + Bot> Bot for MemoryWrapper<T> {
    fn choose_flip(&mut self, state: &BoardState) -> Option<(usize, usize)> {
        self.bot.get_memory().observe(state);
        self.bot.choose_flip(state)
    }
}
