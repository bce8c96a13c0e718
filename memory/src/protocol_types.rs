use serde::{Deserialize, Serialize};

/// How a single cell looks to one particular player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "label", rename_all = "lowercase")]
pub enum CellStatus {
    /// There is no card here (any more).
    None,
    /// A face-down card.
    Down,
    /// A face-up card that the viewer does not control.
    Up(String),
    /// A face-up card controlled by the viewer.
    Mine(String),
}

impl CellStatus {
    pub fn label(&self) -> Option<&str> {
        match self {
            CellStatus::None | CellStatus::Down => None,
            CellStatus::Up(label) | CellStatus::Mine(label) => Some(label),
        }
    }

    /// The two-character marker used in the text view.
    pub fn marker(&self) -> String {
        match self {
            CellStatus::None => String::from("  "),
            CellStatus::Down => String::from(" *"),
            CellStatus::Up(label) => format!(" {}", label),
            CellStatus::Mine(label) => format!(">{}", label),
        }
    }
}

impl std::fmt::Display for CellStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellStatus::None => write!(f, "none"),
            CellStatus::Down => write!(f, "down"),
            CellStatus::Up(label) => write!(f, "up {}", label),
            CellStatus::Mine(label) => write!(f, "mine {}", label),
        }
    }
}

/// A snapshot of the whole board as seen by one player.
///
/// The cells are in row-major order, `(1, 1)` first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<CellStatus>,
}

impl BoardState {
    /// The cell at the 1-based coordinates, if they are on the board.
    pub fn get(&self, row: usize, col: usize) -> Option<&CellStatus> {
        if row == 0 || col == 0 || row > self.height || col > self.width {
            return None;
        }
        self.cells.get((row - 1) * self.width + (col - 1))
    }

    /// Iterates over `(row, col, cell)`, with 1-based coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &CellStatus)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, cell)| (idx / width + 1, idx % width + 1, cell))
    }

    /// The coordinates of the viewer's own cards.
    pub fn mine(&self) -> Vec<(usize, usize)> {
        self.iter()
            .filter(|(_, _, cell)| matches!(cell, CellStatus::Mine(_)))
            .map(|(row, col, _)| (row, col))
            .collect()
    }

    pub fn cards_left(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| **cell != CellStatus::None)
            .count()
    }
}

/// The structured view: width, height, then one line per cell.
impl std::fmt::Display for BoardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.width)?;
        writeln!(f, "{}", self.height)?;
        for cell in &self.cells {
            writeln!(f, "{}", cell)?;
        }
        Ok(())
    }
}

/// A request in the line-based text protocol.
///
/// The [`Display`](std::fmt::Display) instance produces the line that is
/// sent over the wire (without the newline).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    /// Act as the given player from now on.
    Hello { player: String },
    /// Reply with the text view.
    Look,
    /// Flip the card at the given 1-based coordinates, then reply with the
    /// text view. Note that the column comes first on the wire.
    Flip { column: usize, row: usize },
    /// Wait for the next change of the board, then reply with the text view.
    Watch,
    /// Reply with a single JSON line containing the [`BoardState`].
    State,
    /// Close the connection.
    Quit,
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Request::Hello { player } => write!(f, "hello {}", player),
            Request::Look => write!(f, "look"),
            Request::Flip { column, row } => write!(f, "flip {} {}", column, row),
            Request::Watch => write!(f, "watch"),
            Request::State => write!(f, "state"),
            Request::Quit => write!(f, "quit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BoardState {
        BoardState {
            width: 2,
            height: 2,
            cells: vec![
                CellStatus::Mine(String::from("A")),
                CellStatus::Down,
                CellStatus::None,
                CellStatus::Up(String::from("B")),
            ],
        }
    }

    #[test]
    fn structured_view() {
        assert_eq!(sample().to_string(), "2\n2\nmine A\ndown\nnone\nup B\n");
    }

    #[test]
    fn coordinates_are_one_based() {
        let state = sample();
        assert_eq!(state.get(1, 1), Some(&CellStatus::Mine(String::from("A"))));
        assert_eq!(state.get(2, 2), Some(&CellStatus::Up(String::from("B"))));
        assert_eq!(state.get(0, 1), None);
        assert_eq!(state.get(3, 1), None);
        assert_eq!(state.mine(), vec![(1, 1)]);
        assert_eq!(state.cards_left(), 3);
    }

    #[test]
    fn markers() {
        let markers: Vec<String> = sample().cells.iter().map(|c| c.marker()).collect();
        assert_eq!(markers, vec![">A", " *", "  ", " B"]);
    }

    #[test]
    fn json_form() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"width":2,"height":2,"cells":[{"status":"mine","label":"A"},{"status":"down"},{"status":"none"},{"status":"up","label":"B"}]}"#
        );
        assert_eq!(serde_json::from_str::<BoardState>(&json).unwrap(), sample());
    }

    #[test]
    fn request_lines() {
        assert_eq!(Request::Flip { column: 3, row: 1 }.to_string(), "flip 3 1");
        assert_eq!(
            Request::Hello {
                player: String::from("alice")
            }
            .to_string(),
            "hello alice"
        );
    }
}
