//! Move selection for the automated opponent.

use super::board::{Board, Coord, Mark};
use super::lines::LineSet;
use rand::seq::SliceRandom;
use tracing::debug;

/// Picks the robot's next move.
///
/// In strict priority order: complete a winning line for `mark`, block
/// an immediate win for the opponent, otherwise take a random legal
/// cell. Ties in the first two tiers resolve to the lowest coordinate
/// in row-major order. Returns `None` only on a full board.
pub fn choose_move(board: &Board, lines: &LineSet, mark: Mark) -> Option<Coord> {
    let open: Vec<Coord> = board.empty_cells().collect();
    if open.is_empty() {
        return None;
    }

    if let Some(c) = open
        .iter()
        .copied()
        .find(|&c| lines.completes_win(board, mark, c))
    {
        debug!(?c, "robot takes winning cell");
        return Some(c);
    }

    let opponent = mark.opponent();
    if let Some(c) = open
        .iter()
        .copied()
        .find(|&c| lines.completes_win(board, opponent, c))
    {
        debug!(?c, "robot blocks opponent win");
        return Some(c);
    }

    open.choose(&mut rand::thread_rng()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Board, LineSet) {
        (Board::new(4), LineSet::new(4))
    }

    #[test]
    fn test_takes_winning_cell() {
        let (mut board, lines) = setup();
        for x in 0..3 {
            board.place(Mark::O, Coord::new(x, 0, 0)).unwrap();
        }
        let c = choose_move(&board, &lines, Mark::O).unwrap();
        assert_eq!(c, Coord::new(3, 0, 0));
    }

    #[test]
    fn test_win_preferred_over_block() {
        let (mut board, lines) = setup();
        // O can win on the pillar at (3,3); X threatens the (y=0,z=0) row
        for x in 0..3 {
            board.place(Mark::X, Coord::new(x, 0, 0)).unwrap();
        }
        for z in 0..3 {
            board.place(Mark::O, Coord::new(3, 3, z)).unwrap();
        }
        let c = choose_move(&board, &lines, Mark::O).unwrap();
        assert_eq!(c, Coord::new(3, 3, 3));
    }

    #[test]
    fn test_blocks_opponent_win() {
        let (mut board, lines) = setup();
        for x in 0..3 {
            board.place(Mark::X, Coord::new(x, 0, 0)).unwrap();
        }
        board.place(Mark::O, Coord::new(0, 1, 1)).unwrap();
        let c = choose_move(&board, &lines, Mark::O).unwrap();
        assert_eq!(c, Coord::new(3, 0, 0));
    }

    #[test]
    fn test_tie_break_is_lowest_row_major() {
        let (mut board, lines) = setup();
        // X threatens two rows at once; the row through (0,...) comes first
        for x in 1..4 {
            board.place(Mark::X, Coord::new(x, 2, 2)).unwrap();
            board.place(Mark::X, Coord::new(x, 3, 3)).unwrap();
        }
        let c = choose_move(&board, &lines, Mark::O).unwrap();
        assert_eq!(c, Coord::new(0, 2, 2));
    }

    #[test]
    fn test_fallback_is_legal() {
        let (mut board, lines) = setup();
        board.place(Mark::X, Coord::new(0, 0, 0)).unwrap();
        for _ in 0..20 {
            let c = choose_move(&board, &lines, Mark::O).unwrap();
            assert!(board.is_legal(c));
        }
    }

    #[test]
    fn test_none_on_full_board() {
        let lines = LineSet::new(2);
        let mut board = Board::new(2);
        for c in [
            Coord::new(0, 0, 0),
            Coord::new(0, 0, 1),
            Coord::new(0, 1, 0),
            Coord::new(0, 1, 1),
        ] {
            board.place(Mark::X, c).unwrap();
        }
        for c in [
            Coord::new(1, 0, 0),
            Coord::new(1, 0, 1),
            Coord::new(1, 1, 0),
            Coord::new(1, 1, 1),
        ] {
            board.place(Mark::O, c).unwrap();
        }
        assert_eq!(choose_move(&board, &lines, Mark::X), None);
    }
}
