//! Win and draw evaluation for a 3x3 board.

use noughts_protocol::{Board, Mark};

/// Every line that wins: three rows, three columns, two diagonals.
///
/// Checked in this order. A single move can only complete lines through
/// its own cell, all with the same mark, so the order never changes the
/// reported winner.
pub const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win(Mark),
    Draw,
}

impl Outcome {
    /// The winning symbol, or `None` on a draw.
    pub fn winner(self) -> Option<Mark> {
        match self {
            Self::Win(mark) => Some(mark),
            Self::Draw => None,
        }
    }
}

/// Returns the mark holding three in a row, if any.
pub fn winner(board: &Board) -> Option<Mark> {
    WIN_LINES.iter().find_map(|&[a, b, c]| {
        let mark = board.get(a)?;
        (board.get(b) == Some(mark) && board.get(c) == Some(mark)).then_some(mark)
    })
}

/// Returns the outcome if the game is over, `None` if play continues.
///
/// A full board with a winning line counts as a win, not a draw.
pub fn evaluate(board: &Board) -> Option<Outcome> {
    if let Some(mark) = winner(board) {
        return Some(Outcome::Win(mark));
    }
    board.is_full().then_some(Outcome::Draw)
}
