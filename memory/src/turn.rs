use parking_lot::RwLock;

use crate::{BoardError, Holdings, Space};

/// What happened to a player's previous pair at the start of their next move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The player held fewer than two cards.
    Nothing,
    /// The two cards matched and were taken off the board.
    Removed { cells: [(usize, usize); 2] },
    /// The two cards did not match. They were released and turned face down,
    /// unless someone else grabbed them in between.
    Released { cells: [(usize, usize); 2] },
}

/// Row-major index of 1-based coordinates, which must be on the board.
pub(crate) fn cell_index(width: usize, row: usize, col: usize) -> usize {
    (row - 1) * width + (col - 1)
}

/// Settles the pair a player turned over during their last move.
///
/// Runs under the grid's write lock, so nobody looking at the board can see
/// one card of the pair settled and the other one not.
///
/// The caller must hold the player's ledger lock, which is what `holdings`
/// is borrowed from.
pub(crate) fn resolve_previous_pair(
    grid: &RwLock<Vec<Space>>,
    width: usize,
    holdings: &mut Holdings,
    player: &str,
) -> Result<Resolution, BoardError> {
    if holdings.len() < 2 {
        return Ok(Resolution::Nothing);
    }
    let pair = [holdings.first.clone(), holdings.second.clone()];
    let cells = [
        (pair[0].row(), pair[0].col()),
        (pair[1].row(), pair[1].col()),
    ];
    let violated = |detail: String| BoardError::InvariantViolated {
        player: String::from(player),
        detail,
    };
    if cells[0] == cells[1] {
        return Err(violated(format!("holds the card at {:?} twice", cells[0])));
    }

    let mut grid = grid.write();
    for space in &pair {
        let idx = cell_index(width, space.row(), space.col());
        if !grid.get(idx).is_some_and(|on_board| on_board.is_same_card(space)) {
            return Err(violated(format!(
                "holds a card at ({}, {}) that is no longer on the board",
                space.row(),
                space.col()
            )));
        }
        if space.owner().as_deref() != Some(player) {
            return Err(violated(format!(
                "holds the card at ({}, {}) without controlling it",
                space.row(),
                space.col()
            )));
        }
    }

    let resolution = if pair[0].matches(&pair[1]) {
        for space in &pair {
            space.release();
            grid[cell_index(width, space.row(), space.col())] = Space::Empty {
                row: space.row(),
                col: space.col(),
            };
        }
        Resolution::Removed { cells }
    } else {
        // Release first: turning face down only works on uncontrolled cards
        for space in &pair {
            space.release();
            space.put_face_down();
        }
        Resolution::Released { cells }
    };
    holdings.clear();
    Ok(resolution)
}
