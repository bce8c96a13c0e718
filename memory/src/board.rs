use crossbeam_channel::Receiver;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::turn::{cell_index, resolve_previous_pair, Resolution};
use crate::{
    visualize_cells, BoardError, BoardLayout, BoardState, Holdings, InvalidBoard, ListenerId,
    ListenerStatus, PlayerLedger, Space, Watchers,
};

/// A Memory Scramble board that many players flip cards on at once.
///
/// Players try to turn over pairs of identical cards:
///
/// 1. Turning over a first card gives the player control of it. A card
///    controlled by someone else cannot be taken; the flip just fails and
///    the player may try again later.
/// 2. Turning over a second card gives the player control of it too. Both
///    cards stay face up.
/// 3. On the player's next move, a matching pair is removed from the board,
///    and a non-matching pair is given up and turned face down (unless
///    somebody took one of the cards in the meantime).
///
/// Coordinates are 1-based, `(1, 1)` is the upper left corner.
///
/// Cards are locked one at a time, each player's turn is serialized by a
/// per-player lock, and settling a pair briefly locks the whole grid so that
/// views never see a pair half-settled. Listeners are called after all of
/// these locks are released.
//
// Lock order: player entry, then grid, then card. Views take grid, then card.
#[derive(Debug)]
pub struct Board {
    width: usize,
    height: usize,
    grid: RwLock<Vec<Space>>,
    players: PlayerLedger,
    watchers: Watchers,
}

impl Board {
    /// Creates a board from a ready-made grid of labels in row-major order.
    ///
    /// `None` cells start out empty.
    pub fn new(
        width: usize,
        height: usize,
        cells: Vec<Option<String>>,
    ) -> Result<Self, InvalidBoard> {
        BoardLayout::new(width, height, cells).map(Self::from_layout)
    }

    pub fn from_layout(layout: BoardLayout) -> Self {
        let grid = layout
            .iter()
            .map(|(row, col, label)| match label {
                Some(label) => Space::card(label, row, col),
                None => Space::Empty { row, col },
            })
            .collect();
        Self {
            width: layout.width(),
            height: layout.height(),
            grid: RwLock::new(grid),
            players: PlayerLedger::new(),
            watchers: Watchers::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn players(&self) -> &PlayerLedger {
        &self.players
    }

    /// Adds a player that holds no cards. Returns false if the player was
    /// already registered, in which case nothing changes.
    pub fn register_player(&self, player: &str) -> bool {
        let added = self.players.register(player);
        debug!(player, added, "Register player");
        added
    }

    /// Plays one move for `player`: first settles the pair they turned over
    /// last time (see [`Board`]), then tries to take control of the card at
    /// `(row, col)`.
    ///
    /// Returns whether the card was taken. Empty spaces, cards controlled by
    /// anyone (the player included) and coordinates off the board all give
    /// `Ok(false)`; the previous pair is settled either way.
    pub fn flip(&self, row: usize, col: usize, player: &str) -> Result<bool, BoardError> {
        let entry = self
            .players
            .entry(player)
            .ok_or_else(|| BoardError::UnknownPlayer {
                player: String::from(player),
            })?;

        let (resolution, claimed) = {
            let mut holdings = entry.lock();
            let resolution = resolve_previous_pair(&self.grid, self.width, &mut holdings, player)?;
            let claimed = self.claim(row, col, player, &mut holdings)?;
            (resolution, claimed)
        };

        if resolution != Resolution::Nothing {
            debug!(player, ?resolution, "Settled previous pair");
            self.watchers.notify();
        }
        trace!(player, row, col, claimed, "Flip");
        if claimed {
            self.watchers.notify();
        }
        Ok(claimed)
    }

    fn claim(
        &self,
        row: usize,
        col: usize,
        player: &str,
        holdings: &mut Holdings,
    ) -> Result<bool, BoardError> {
        let Some(idx) = self.index(row, col) else {
            return Ok(false);
        };
        let grid = self.grid.read();
        let space = &grid[idx];
        if !space.claim(player) {
            return Ok(false);
        }
        holdings.push(space.clone()).map_err(|space| {
            space.release();
            BoardError::InvariantViolated {
                player: String::from(player),
                detail: format!(
                    "took the card at ({}, {}) while already holding two cards",
                    row, col
                ),
            }
        })?;
        Ok(true)
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        if (1..=self.height).contains(&row) && (1..=self.width).contains(&col) {
            Some(cell_index(self.width, row, col))
        } else {
            None
        }
    }

    /// The space at the given coordinates, or `None` if they are off the board.
    pub fn space(&self, row: usize, col: usize) -> Option<Space> {
        let idx = self.index(row, col)?;
        Some(self.grid.read()[idx].clone())
    }

    /// What the player currently holds.
    pub fn holdings_of(&self, player: &str) -> Result<Holdings, BoardError> {
        self.players
            .holdings_of(player)
            .ok_or_else(|| BoardError::UnknownPlayer {
                player: String::from(player),
            })
    }

    /// One consistent snapshot of the board, as seen by `viewer`.
    pub fn state(&self, viewer: &str) -> Result<BoardState, BoardError> {
        if !self.players.is_registered(viewer) {
            return Err(BoardError::UnknownPlayer {
                player: String::from(viewer),
            });
        }
        let cells = self
            .grid
            .read()
            .iter()
            .map(|space| space.status_for(viewer))
            .collect();
        Ok(BoardState {
            width: self.width,
            height: self.height,
            cells,
        })
    }

    /// The text view of the board for `viewer`, one line per row.
    ///
    /// Each cell is two characters: `>` and the label for the viewer's own
    /// cards, a space and the label for other face-up cards, ` *` for
    /// face-down cards and two spaces for empty spaces.
    pub fn render(&self, viewer: &str) -> Result<String, BoardError> {
        self.state(viewer).map(|state| visualize_cells(&state))
    }

    /// Registers a listener that is called after every change of the board.
    ///
    /// See [`Watchers`] for the rules listeners must follow.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() -> ListenerStatus + Send + Sync + 'static,
    {
        self.watchers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.watchers.unsubscribe(id)
    }

    /// Receives one message on the next change of the board.
    ///
    /// Pass the id to [`Self::unsubscribe()`] when giving up on the wait.
    pub fn watch(&self) -> (ListenerId, Receiver<()>) {
        self.watchers.watch()
    }

    /// How many listeners are subscribed right now.
    pub fn num_watchers(&self) -> usize {
        self.watchers.len()
    }

    /// Checks that card ownership and the ledger agree.
    ///
    /// Only meaningful while nobody is flipping.
    pub fn check_invariants(&self) -> Result<(), BoardError> {
        let holdings = self.players.snapshot();
        let grid = self.grid.read();
        let violated = |player: &str, detail: String| BoardError::InvariantViolated {
            player: String::from(player),
            detail,
        };
        if grid.len() != self.width * self.height {
            return Err(violated("", format!("the grid has {} cells", grid.len())));
        }

        for (player, held) in &holdings {
            if held.first.is_empty() && !held.second.is_empty() {
                return Err(violated(player.as_str(), String::from("second slot filled first")));
            }
            if held.len() == 2
                && (held.first.row(), held.first.col()) == (held.second.row(), held.second.col())
            {
                return Err(violated(player.as_str(), String::from("holds one cell twice")));
            }
            for space in [&held.first, &held.second] {
                if !space.is_empty() && space.owner().as_deref() != Some(player.as_str()) {
                    return Err(violated(player.as_str(), String::from("holds a card it does not own")));
                }
            }
        }

        for space in grid.iter() {
            let Some(owner) = space.owner() else {
                continue;
            };
            if !space.is_face_up() {
                return Err(violated(owner.as_str(), String::from("owns a face-down card")));
            }
            let referenced = holdings
                .iter()
                .any(|(player, held)| *player == owner && held.contains(space));
            if !referenced {
                return Err(violated(
                    owner.as_str(),
                    format!(
                        "owns the card at ({}, {}) without holding it",
                        space.row(),
                        space.col()
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Shows the labels of the cards still on the board, `.` for empty spaces.
impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "MEMORY: {} x {}", self.height, self.width)?;
        let grid = self.grid.read();
        for row in grid.chunks(self.width) {
            let labels: Vec<&str> = row.iter().map(|s| s.label().unwrap_or(".")).collect();
            writeln!(f, "{}", labels.join(" "))?;
        }
        Ok(())
    }
}
