use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const BOARD_WIDTH: u8 = 7;
pub const CELL_COUNT: u8 = BOARD_WIDTH * BOARD_WIDTH;

// The eight compass directions as (dx, dy)
pub const DIRECTIONS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    #[error("Cell index {0} is outside the board")]
    OutOfBounds(i64),
    #[error("Cell {0} is occupied more than once")]
    Overlap(Cell),
}

/// A square of the 7x7 board, stored as its linear index.
///
/// The index decomposes row-major: `x = idx % 7`, `y = idx / 7`.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "i64", into = "u8")]
pub struct Cell(u8);

impl Cell {
    pub fn new(idx: u8) -> Result<Self, BoardError> {
        if idx < CELL_COUNT {
            Ok(Cell(idx))
        } else {
            Err(BoardError::OutOfBounds(idx.into()))
        }
    }

    // Returns None when the coordinates fall off the board
    pub fn from_xy(x: i32, y: i32) -> Option<Self> {
        let width = i32::from(BOARD_WIDTH);
        if !(0..width).contains(&x) || !(0..width).contains(&y) {
            return None;
        }
        u8::try_from(y * width + x).ok().map(Cell)
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    pub fn to_xy(&self) -> (i32, i32) {
        let idx = i32::from(self.0);
        let width = i32::from(BOARD_WIDTH);
        (idx % width, idx / width)
    }

    pub fn add_xy(&self, dx: i32, dy: i32) -> Option<Self> {
        let (x, y) = self.to_xy();
        Cell::from_xy(x + dx, y + dy)
    }

    /// Chebyshev distance: the number of king moves between two cells.
    pub fn distance(&self, other: Cell) -> i32 {
        let (x1, y1) = self.to_xy();
        let (x2, y2) = other.to_xy();
        (x1 - x2).abs().max((y1 - y2).abs())
    }

    pub fn all() -> impl Iterator<Item = Cell> {
        (0..CELL_COUNT).map(Cell)
    }
}

impl TryFrom<i64> for Cell {
    type Error = BoardError;

    fn try_from(idx: i64) -> Result<Self, Self::Error> {
        u8::try_from(idx)
            .map_err(|_| BoardError::OutOfBounds(idx))
            .and_then(Cell::new)
    }
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> u8 {
        cell.0
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
