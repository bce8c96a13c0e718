use crate::BoardState;

/// Renders the text view of a board: one line per row, two characters per
/// cell (see [`CellStatus::marker()`](crate::CellStatus::marker)), and no
/// trailing newline.
pub fn visualize_cells(state: &BoardState) -> String {
    let mut result = String::with_capacity(state.cells.len() * 2 + state.height);
    for (idx, row) in state.cells.chunks(state.width).enumerate() {
        if idx > 0 {
            result.push('\n');
        }
        for cell in row {
            result += &cell.marker();
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellStatus;

    #[test]
    fn text_view() {
        let state = BoardState {
            width: 3,
            height: 2,
            cells: vec![
                CellStatus::Mine(String::from("A")),
                CellStatus::Down,
                CellStatus::Up(String::from("🌈")),
                CellStatus::None,
                CellStatus::Down,
                CellStatus::Down,
            ],
        };
        assert_eq!(visualize_cells(&state), ">A * 🌈\n   * *");
    }
}
