//! Winning-line enumeration and win detection for the cubic board.

use super::board::{Board, Coord, Mark};

/// All winning lines for a cubic board of a given side length.
///
/// Lines are enumerated once per board size, in canonical order: rows,
/// then columns, then pillars, then plane diagonals, then the four
/// space diagonals. `check_win` reports the first completed line in
/// that order, which keeps `win_positions` reproducible when one move
/// completes several lines at once.
#[derive(Debug, Clone)]
pub struct LineSet {
    size: usize,
    lines: Vec<Vec<Coord>>,
}

impl LineSet {
    /// Enumerates every winning line for a board of side `size`.
    pub fn new(size: usize) -> Self {
        let n = size;
        let mut lines = Vec::new();

        // Rows: vary x
        for y in 0..n {
            for z in 0..n {
                lines.push((0..n).map(|x| Coord::new(x, y, z)).collect());
            }
        }
        // Columns: vary y
        for x in 0..n {
            for z in 0..n {
                lines.push((0..n).map(|y| Coord::new(x, y, z)).collect());
            }
        }
        // Pillars: vary z
        for x in 0..n {
            for y in 0..n {
                lines.push((0..n).map(|z| Coord::new(x, y, z)).collect());
            }
        }
        // Face diagonals in each xy slice
        for z in 0..n {
            lines.push((0..n).map(|i| Coord::new(i, i, z)).collect());
            lines.push((0..n).map(|i| Coord::new(i, n - 1 - i, z)).collect());
        }
        // Face diagonals in each xz slice
        for y in 0..n {
            lines.push((0..n).map(|i| Coord::new(i, y, i)).collect());
            lines.push((0..n).map(|i| Coord::new(i, y, n - 1 - i)).collect());
        }
        // Face diagonals in each yz slice
        for x in 0..n {
            lines.push((0..n).map(|i| Coord::new(x, i, i)).collect());
            lines.push((0..n).map(|i| Coord::new(x, i, n - 1 - i)).collect());
        }
        // Space diagonals
        lines.push((0..n).map(|i| Coord::new(i, i, i)).collect());
        lines.push((0..n).map(|i| Coord::new(i, i, n - 1 - i)).collect());
        lines.push((0..n).map(|i| Coord::new(i, n - 1 - i, i)).collect());
        lines.push((0..n).map(|i| Coord::new(n - 1 - i, i, i)).collect());

        Self { size, lines }
    }

    /// Board side length these lines were built for.
    pub fn size(&self) -> usize {
        self.size
    }

    /// All lines in canonical order.
    pub fn lines(&self) -> &[Vec<Coord>] {
        &self.lines
    }

    /// Returns the first line fully occupied by `mark`, if any.
    pub fn check_win(&self, board: &Board, mark: Mark) -> Option<&[Coord]> {
        self.lines
            .iter()
            .find(|line| line.iter().all(|&c| board.get(c) == Some(mark)))
            .map(|line| line.as_slice())
    }

    /// True iff placing `mark` on the empty cell `c` would complete a line.
    pub fn completes_win(&self, board: &Board, mark: Mark, c: Coord) -> bool {
        if !board.is_legal(c) {
            return false;
        }
        self.lines.iter().any(|line| {
            line.contains(&c) && line.iter().all(|&p| p == c || board.get(p) == Some(mark))
        })
    }
}
