//! Cubic board state for three-dimensional tic-tac-toe.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

/// Default board side length.
pub const DEFAULT_BOARD_SIZE: usize = 4;

/// Mark placed by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// Mark X (goes first).
    X,
    /// Mark O (goes second).
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// Coordinates of a single cell on the cubic board.
///
/// Serializes as a `[x, y, z]` triple, the shape clients consume in
/// `win_positions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    /// Row axis.
    pub x: usize,
    /// Column axis.
    pub y: usize,
    /// Pillar axis.
    pub z: usize,
}

impl Coord {
    /// Creates a coordinate from its three components.
    pub fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }
}

impl Serialize for Coord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.x, self.y, self.z).serialize(serializer)
    }
}

/// Errors that can occur when placing a mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum MoveError {
    /// Coordinates fall outside the board.
    #[display("Coordinates out of bounds")]
    OutOfBounds,
    /// Cell already holds a mark.
    #[display("Cell is already occupied")]
    CellOccupied,
    /// Game is not accepting moves.
    #[display("Game is not active")]
    NotActive,
}

/// Cubic grid of cells, each empty or holding one mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Mark>>,
}

impl Board {
    /// Creates an empty board with the given side length.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size * size],
        }
    }

    /// Returns the side length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Row-major flat index: x outermost, z innermost.
    fn index(&self, c: Coord) -> usize {
        (c.x * self.size + c.y) * self.size + c.z
    }

    /// Checks that coordinates lie within the board.
    pub fn contains(&self, c: Coord) -> bool {
        c.x < self.size && c.y < self.size && c.z < self.size
    }

    /// Returns the mark at the given cell, if any.
    ///
    /// Out-of-bounds coordinates read as empty.
    pub fn get(&self, c: Coord) -> Option<Mark> {
        if !self.contains(c) {
            return None;
        }
        self.cells[self.index(c)]
    }

    /// True iff the cell is on the board and empty.
    pub fn is_legal(&self, c: Coord) -> bool {
        self.contains(c) && self.cells[self.index(c)].is_none()
    }

    /// Places a mark on an empty cell.
    pub fn place(&mut self, mark: Mark, c: Coord) -> Result<(), MoveError> {
        if !self.contains(c) {
            return Err(MoveError::OutOfBounds);
        }
        let idx = self.index(c);
        if self.cells[idx].is_some() {
            return Err(MoveError::CellOccupied);
        }
        self.cells[idx] = Some(mark);
        Ok(())
    }

    /// True iff no empty cell remains.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_some())
    }

    /// Number of marks currently placed.
    pub fn mark_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Empty cells in canonical row-major order.
    pub fn empty_cells(&self) -> impl Iterator<Item = Coord> + '_ {
        let n = self.size;
        (0..n).flat_map(move |x| {
            (0..n).flat_map(move |y| (0..n).map(move |z| Coord::new(x, y, z)))
        })
        .filter(|&c| self.is_legal(c))
    }

    /// Nested `[x][y][z]` grid, the shape serialized to clients.
    pub fn to_grid(&self) -> Vec<Vec<Vec<Option<Mark>>>> {
        let n = self.size;
        (0..n)
            .map(|x| {
                (0..n)
                    .map(|y| (0..n).map(|z| self.get(Coord::new(x, y, z))).collect())
                    .collect()
            })
            .collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_BOARD_SIZE)
    }
}
