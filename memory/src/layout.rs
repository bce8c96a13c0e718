use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::{InvalidBoard, LayoutFromStrErr};

/// The initial contents of a board, before anyone plays on it.
///
/// `cells` is in row-major order; `None` is an empty space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardLayout {
    width: usize,
    height: usize,
    cells: Vec<Option<String>>,
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty() && !label.chars().any(char::is_whitespace)
}

impl BoardLayout {
    /// Checks the dimensions and labels of a ready-made grid.
    pub fn new(
        width: usize,
        height: usize,
        cells: Vec<Option<String>>,
    ) -> Result<Self, InvalidBoard> {
        if width == 0 || height == 0 {
            return Err(InvalidBoard::ZeroDimension { width, height });
        }
        let Some(num_cells) = width.checked_mul(height) else {
            return Err(InvalidBoard::TooLarge { width, height });
        };
        if cells.len() != num_cells {
            return Err(InvalidBoard::WrongCellCount {
                expected: num_cells,
                actual: cells.len(),
            });
        }
        for (idx, cell) in cells.iter().enumerate() {
            if let Some(label) = cell.as_deref().filter(|l| !is_valid_label(l)) {
                return Err(InvalidBoard::InvalidLabel {
                    row: idx / width + 1,
                    col: idx % width + 1,
                    label: String::from(label),
                });
            }
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Deals pairs of cards onto a `width` x `height` board.
    ///
    /// The pairs cycle through the distinct labels, so every label appears
    /// as often as possible and the counts differ by at most one pair. With
    /// an odd number of cells, one space stays empty. The result is
    /// shuffled with `rng`.
    pub fn random<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        labels: &[String],
        rng: &mut R,
    ) -> Result<Self, InvalidBoard> {
        if width == 0 || height == 0 {
            return Err(InvalidBoard::ZeroDimension { width, height });
        }
        let Some(num_cells) = width.checked_mul(height) else {
            return Err(InvalidBoard::TooLarge { width, height });
        };
        let mut distinct: Vec<&String> = Vec::with_capacity(labels.len());
        for label in labels {
            if !is_valid_label(label) {
                return Err(InvalidBoard::InvalidLabel {
                    row: 0,
                    col: 0,
                    label: label.clone(),
                });
            }
            if !distinct.contains(&label) {
                distinct.push(label);
            }
        }
        if distinct.is_empty() {
            return Err(InvalidBoard::NoLabels);
        }

        let mut cells = Vec::with_capacity(num_cells);
        for pair_idx in 0..num_cells / 2 {
            let label = distinct[pair_idx % distinct.len()];
            cells.push(Some(label.clone()));
            cells.push(Some(label.clone()));
        }
        if num_cells % 2 == 1 {
            cells.push(None);
        }
        cells.shuffle(rng);
        Self::new(width, height, cells)
    }

    /// Parses a board file and deals a random board from it.
    ///
    /// The format is the number of rows on the first line, the number of
    /// columns on the second line, and then one card label per line. Blank
    /// lines are ignored.
    pub fn parse<R: Rng + ?Sized>(text: &str, rng: &mut R) -> Result<Self, LayoutFromStrErr> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());
        let parse_number = |(line, text): (usize, &str)| {
            text.parse::<usize>()
                .map_err(|_| LayoutFromStrErr::InvalidNumber {
                    line,
                    text: String::from(text),
                })
        };
        let rows = parse_number(lines.next().ok_or(LayoutFromStrErr::MissingRows)?)?;
        let columns = parse_number(lines.next().ok_or(LayoutFromStrErr::MissingColumns)?)?;
        let labels: Vec<String> = lines.map(|(_, label)| String::from(label)).collect();
        Ok(Self::random(columns, rows, &labels, rng)?)
    }

    /// Reads and parses a board file, see [`Self::parse()`].
    pub fn load<R: Rng + ?Sized>(path: &Path, rng: &mut R) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text, rng)?)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }

    /// Iterates over `(row, col, label)`, with 1-based coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Option<&str>)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, cell)| (idx / width + 1, idx % width + 1, cell.as_deref()))
    }
}
