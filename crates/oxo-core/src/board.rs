use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::PlayerId;

pub const BOARD_SIZE: usize = 3;

/// The symbol a player places on the board. The first joiner plays X,
/// the second plays O.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn other(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::O => "O",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cell coordinate as sent by clients. Signed so that out-of-range
/// input is rejected as an illegal move rather than a parse failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    fn index(self) -> Option<(usize, usize)> {
        let row = usize::try_from(self.row).ok().filter(|r| *r < BOARD_SIZE)?;
        let col = usize::try_from(self.col).ok().filter(|c| *c < BOARD_SIZE)?;
        Some((row, col))
    }
}

/// A 3x3 grid. A cell goes from empty to marked exactly once and never
/// back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Mark>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `mover` may claim `position`. The turn check runs before
    /// the bounds and occupancy checks.
    pub fn is_legal_move(
        &self,
        turn_holder: Option<&PlayerId>,
        mover: &PlayerId,
        position: Position,
    ) -> bool {
        if turn_holder != Some(mover) {
            return false;
        }
        let Some((row, col)) = position.index() else {
            return false;
        };
        self.cells[row][col].is_none()
    }

    /// Write a mark. Out-of-range positions are ignored; callers are
    /// expected to have validated with `is_legal_move` first.
    pub fn place(&mut self, position: Position, mark: Mark) {
        if let Some((row, col)) = position.index() {
            self.cells[row][col] = Some(mark);
        }
    }

    pub fn get(&self, position: Position) -> Option<Mark> {
        let (row, col) = position.index()?;
        self.cells[row][col]
    }

    /// The mark occupying a completed line, if any. Lines are checked in
    /// a fixed order: rows, then columns, then the main diagonal, then
    /// the anti-diagonal.
    pub fn winner(&self) -> Option<Mark> {
        for row in 0..BOARD_SIZE {
            if let Some(mark) = self.cells[row][0] {
                if self.cells[row][1] == Some(mark) && self.cells[row][2] == Some(mark) {
                    return Some(mark);
                }
            }
        }

        for col in 0..BOARD_SIZE {
            if let Some(mark) = self.cells[0][col] {
                if self.cells[1][col] == Some(mark) && self.cells[2][col] == Some(mark) {
                    return Some(mark);
                }
            }
        }

        if let Some(mark) = self.cells[0][0] {
            if self.cells[1][1] == Some(mark) && self.cells[2][2] == Some(mark) {
                return Some(mark);
            }
        }

        if let Some(mark) = self.cells[0][2] {
            if self.cells[1][1] == Some(mark) && self.cells[2][0] == Some(mark) {
                return Some(mark);
            }
        }

        None
    }

    pub fn is_full(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(Option::is_some))
    }

    /// Wire projection: "" for empty cells, "X"/"O" otherwise.
    pub fn render(&self) -> Vec<Vec<String>> {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (PlayerId, PlayerId) {
        (PlayerId::new(), PlayerId::new())
    }

    #[test]
    fn mark_other_flips() {
        assert_eq!(Mark::X.other(), Mark::O);
        assert_eq!(Mark::O.other(), Mark::X);
    }

    #[test]
    fn empty_board_has_no_winner_and_is_not_full() {
        let board = Board::new();
        assert_eq!(board.winner(), None);
        assert!(!board.is_full());
    }

    #[test]
    fn legal_move_on_empty_cell() {
        let board = Board::new();
        let (p1, _) = ids();
        assert!(board.is_legal_move(Some(&p1), &p1, Position::new(0, 0)));
        assert!(board.is_legal_move(Some(&p1), &p1, Position::new(2, 2)));
    }

    #[test]
    fn move_rejected_when_not_turn_holder() {
        let board = Board::new();
        let (p1, p2) = ids();
        assert!(!board.is_legal_move(Some(&p1), &p2, Position::new(0, 0)));
        assert!(!board.is_legal_move(None, &p2, Position::new(0, 0)));
    }

    #[test]
    fn move_rejected_out_of_bounds() {
        let board = Board::new();
        let (p1, _) = ids();
        assert!(!board.is_legal_move(Some(&p1), &p1, Position::new(3, 0)));
        assert!(!board.is_legal_move(Some(&p1), &p1, Position::new(0, 3)));
        assert!(!board.is_legal_move(Some(&p1), &p1, Position::new(-1, 0)));
        assert!(!board.is_legal_move(Some(&p1), &p1, Position::new(0, -1)));
    }

    #[test]
    fn move_rejected_on_occupied_cell() {
        let mut board = Board::new();
        let (p1, _) = ids();
        board.place(Position::new(1, 1), Mark::X);
        assert!(!board.is_legal_move(Some(&p1), &p1, Position::new(1, 1)));
        assert!(board.is_legal_move(Some(&p1), &p1, Position::new(0, 1)));
    }

    #[test]
    fn winner_detects_every_row_and_column() {
        for i in 0..3 {
            let mut board = Board::new();
            for j in 0..3 {
                board.place(Position::new(i, j), Mark::X);
            }
            assert_eq!(board.winner(), Some(Mark::X), "row {i}");

            let mut board = Board::new();
            for j in 0..3 {
                board.place(Position::new(j, i), Mark::O);
            }
            assert_eq!(board.winner(), Some(Mark::O), "col {i}");
        }
    }

    #[test]
    fn winner_detects_diagonals() {
        let mut board = Board::new();
        for i in 0..3 {
            board.place(Position::new(i, i), Mark::X);
        }
        assert_eq!(board.winner(), Some(Mark::X));

        let mut board = Board::new();
        for i in 0..3 {
            board.place(Position::new(i, 2 - i), Mark::O);
        }
        assert_eq!(board.winner(), Some(Mark::O));
    }

    #[test]
    fn mixed_line_is_not_a_win() {
        let mut board = Board::new();
        board.place(Position::new(0, 0), Mark::X);
        board.place(Position::new(0, 1), Mark::O);
        board.place(Position::new(0, 2), Mark::X);
        assert_eq!(board.winner(), None);
    }

    #[test]
    fn full_board_detection() {
        let mut board = Board::new();
        for row in 0..3 {
            for col in 0..3 {
                assert!(!board.is_full());
                board.place(Position::new(row, col), Mark::X);
            }
        }
        assert!(board.is_full());
    }

    #[test]
    fn render_maps_cells_to_strings() {
        let mut board = Board::new();
        board.place(Position::new(0, 0), Mark::X);
        board.place(Position::new(1, 1), Mark::O);
        let rows = board.render();
        assert_eq!(rows[0][0], "X");
        assert_eq!(rows[1][1], "O");
        assert_eq!(rows[2][2], "");
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.len() == 3));
    }

    #[test]
    fn place_ignores_out_of_range() {
        let mut board = Board::new();
        board.place(Position::new(5, 5), Mark::X);
        assert_eq!(board, Board::new());
    }
}
