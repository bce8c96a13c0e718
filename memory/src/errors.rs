/// The error type for building a [`Board`](crate::Board) or a [`BoardLayout`](crate::BoardLayout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidBoard {
    ZeroDimension { width: usize, height: usize },
    TooLarge { width: usize, height: usize },
    WrongCellCount { expected: usize, actual: usize },
    InvalidLabel { row: usize, col: usize, label: String },
    NoLabels,
}

impl std::error::Error for InvalidBoard {}

impl std::fmt::Display for InvalidBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidBoard::ZeroDimension { width, height } => write!(
                f,
                "A board needs a positive width and height, but got {}x{}",
                width, height
            ),
            InvalidBoard::TooLarge { width, height } => {
                write!(f, "A {}x{} board has more cells than can be counted", width, height)
            }
            InvalidBoard::WrongCellCount { expected, actual } => write!(
                f,
                "Expected {} cells for the board, but got {}",
                expected, actual
            ),
            InvalidBoard::InvalidLabel { row, col, label } => write!(
                f,
                "The card label {:?} at ({}, {}) is empty or contains whitespace",
                label, row, col
            ),
            InvalidBoard::NoLabels => write!(f, "At least one card label is needed"),
        }
    }
}

/// The error type for [`Board::flip()`](crate::Board::flip) and the board views.
///
/// Only [`BoardError::InvariantViolated`] is fatal: it means the board's
/// bookkeeping is broken, not that a player did something unexpected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    UnknownPlayer { player: String },
    InvariantViolated { player: String, detail: String },
}

impl BoardError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, BoardError::InvariantViolated { .. })
    }
}

impl std::error::Error for BoardError {}

impl std::fmt::Display for BoardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoardError::UnknownPlayer { player } => {
                write!(f, "No player with id '{}' is registered", player)
            }
            BoardError::InvariantViolated { player, detail } => write!(
                f,
                "Board invariant violated while handling player '{}': {}",
                player, detail
            ),
        }
    }
}

/// The error type for [`BoardLayout::parse()`](crate::BoardLayout::parse),
/// i.e. for reading board files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutFromStrErr {
    MissingRows,
    MissingColumns,
    InvalidNumber { line: usize, text: String },
    Board(InvalidBoard),
}

impl std::error::Error for LayoutFromStrErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LayoutFromStrErr::Board(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for LayoutFromStrErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutFromStrErr::MissingRows => write!(f, "The board file has no row count"),
            LayoutFromStrErr::MissingColumns => {
                write!(f, "The board file has no column count")
            }
            LayoutFromStrErr::InvalidNumber { line, text } => {
                write!(f, "Line {} should be a number, but is {:?}", line, text)
            }
            LayoutFromStrErr::Board(_) => write!(f, "The board file describes an invalid board"),
        }
    }
}

impl From<InvalidBoard> for LayoutFromStrErr {
    fn from(err: InvalidBoard) -> Self {
        LayoutFromStrErr::Board(err)
    }
}
