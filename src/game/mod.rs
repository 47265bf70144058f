mod board;
mod lines;
mod robot;
mod state;

pub use board::{Board, Coord, DEFAULT_BOARD_SIZE, Mark, MoveError};
pub use lines::LineSet;
pub use robot::choose_move;
pub use state::{
    Game, GameView, Participant, PlayerId, PlayerKind, SeatTaken, Status, Winner,
};
