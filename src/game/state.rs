//! Game state machine composing the board, win detection, and seats.

use super::board::{Board, Coord, Mark, MoveError};
use super::lines::LineSet;
use serde::{Serialize, Serializer};
use tracing::{debug, instrument};

/// Opaque identity of a connected player.
pub type PlayerId = String;

/// Occupant of a seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Participant {
    /// A human connection, identified by its transport identity.
    Human(PlayerId),
    /// The server-driven automated player.
    Robot,
}

/// Kind of player a seat was created for. Fixed at game creation, even
/// while the seat itself is vacant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerKind {
    /// Seat belongs to a human.
    Human,
    /// Seat belongs to the robot.
    Robot,
}

/// Lifecycle status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Roster incomplete; moves are rejected.
    Waiting,
    /// Both seats filled; moves accepted.
    Active,
    /// Winner decided or board full. Terminal.
    Ended,
}

/// Final result of a game, set once and never cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    /// The given mark completed a line.
    Mark(Mark),
    /// Board filled with no completed line.
    Draw,
}

impl Serialize for Winner {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Winner::Mark(mark) => mark.serialize(serializer),
            Winner::Draw => serializer.serialize_str("draw"),
        }
    }
}

/// Serialized game state, the exact shape sent in HTTP responses and
/// `game_update` broadcasts.
#[derive(Debug, Clone, Serialize)]
pub struct GameView {
    /// Full cell grid, indexed `[x][y][z]`.
    pub board: Vec<Vec<Vec<Option<Mark>>>>,
    /// Mark whose turn it is.
    pub current_player: Mark,
    /// `null`, a mark, or `"draw"`.
    pub winner: Option<Winner>,
    /// Lifecycle status.
    pub status: Status,
    /// Coordinates of the winning line, empty until a winner is set.
    pub win_positions: Vec<Coord>,
}

/// A single game: board, seats, turn order, and outcome.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    lines: LineSet,
    current_player: Mark,
    player_x: Option<Participant>,
    player_o: Option<Participant>,
    kind_x: PlayerKind,
    kind_o: PlayerKind,
    status: Status,
    winner: Option<Winner>,
    win_positions: Vec<Coord>,
}

impl Game {
    fn new(size: usize) -> Self {
        Self {
            board: Board::new(size),
            lines: LineSet::new(size),
            current_player: Mark::X,
            player_x: None,
            player_o: None,
            kind_x: PlayerKind::Human,
            kind_o: PlayerKind::Human,
            status: Status::Waiting,
            winner: None,
            win_positions: Vec::new(),
        }
    }

    /// Creates a single-player game: creator as X, robot bound as O,
    /// immediately active.
    #[instrument]
    pub fn new_single(creator: PlayerId, size: usize) -> Self {
        let mut game = Self::new(size);
        game.player_x = Some(Participant::Human(creator));
        game.player_o = Some(Participant::Robot);
        game.kind_o = PlayerKind::Robot;
        game.status = Status::Active;
        game
    }

    /// Creates a two-player game: creator as X, waiting for O to join.
    #[instrument]
    pub fn new_double(creator: PlayerId, size: usize) -> Self {
        let mut game = Self::new(size);
        game.player_x = Some(Participant::Human(creator));
        game
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the precomputed winning lines.
    pub fn lines(&self) -> &LineSet {
        &self.lines
    }

    /// Returns the mark whose turn it is.
    pub fn current_player(&self) -> Mark {
        self.current_player
    }

    /// Returns the lifecycle status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns the final result, if decided.
    pub fn winner(&self) -> Option<Winner> {
        self.winner
    }

    /// Returns the winning line coordinates (empty until a win).
    pub fn win_positions(&self) -> &[Coord] {
        &self.win_positions
    }

    /// Returns the occupant of the given mark's seat.
    pub fn participant(&self, mark: Mark) -> Option<&Participant> {
        match mark {
            Mark::X => self.player_x.as_ref(),
            Mark::O => self.player_o.as_ref(),
        }
    }

    /// Returns the fixed kind of the given mark's seat.
    pub fn kind(&self, mark: Mark) -> PlayerKind {
        match mark {
            Mark::X => self.kind_x,
            Mark::O => self.kind_o,
        }
    }

    /// Returns the mark bound to the given identity, if any.
    pub fn seat_of(&self, id: &str) -> Option<Mark> {
        match (&self.player_x, &self.player_o) {
            (Some(Participant::Human(p)), _) if p == id => Some(Mark::X),
            (_, Some(Participant::Human(p))) if p == id => Some(Mark::O),
            _ => None,
        }
    }

    /// Number of human participants currently bound to a seat.
    pub fn humans_remaining(&self) -> usize {
        [&self.player_x, &self.player_o]
            .iter()
            .filter(|seat| matches!(seat, Some(Participant::Human(_))))
            .count()
    }

    /// Binds the second human and activates the game.
    ///
    /// Fails if the O seat is already taken.
    #[instrument(skip(self))]
    pub fn join_second(&mut self, player: PlayerId) -> Result<(), SeatTaken> {
        if self.player_o.is_some() {
            return Err(SeatTaken);
        }
        self.player_o = Some(Participant::Human(player));
        self.status = Status::Active;
        Ok(())
    }

    /// Promotes a waiting game with a full roster to active.
    pub fn activate_if_full(&mut self) {
        if self.status == Status::Waiting && self.player_x.is_some() && self.player_o.is_some() {
            self.status = Status::Active;
        }
    }

    /// Clears the seat bound to `id`, returning the vacated mark.
    ///
    /// The seat's kind is unchanged, so a rejoined game keeps its
    /// original human/robot layout.
    pub fn vacate(&mut self, id: &str) -> Option<Mark> {
        match self.seat_of(id) {
            Some(Mark::X) => {
                self.player_x = None;
                Some(Mark::X)
            }
            Some(Mark::O) => {
                self.player_o = None;
                Some(Mark::O)
            }
            None => None,
        }
    }

    /// Marks the game as waiting for its roster to refill.
    pub fn set_waiting(&mut self) {
        self.status = Status::Waiting;
    }

    /// Applies a move for the mark whose turn it is.
    ///
    /// On success the cell is marked and either the turn flips or the
    /// game ends (win or draw). Rejected moves leave all state
    /// untouched.
    #[instrument(skip(self), fields(mark = ?self.current_player))]
    pub fn make_move(&mut self, c: Coord) -> Result<(), MoveError> {
        if self.status != Status::Active {
            return Err(MoveError::NotActive);
        }
        let mark = self.current_player;
        self.board.place(mark, c)?;

        if let Some(line) = self.lines.check_win(&self.board, mark) {
            self.winner = Some(Winner::Mark(mark));
            self.win_positions = line.to_vec();
            self.status = Status::Ended;
            debug!(?mark, "game won");
        } else if self.board.is_full() {
            self.winner = Some(Winner::Draw);
            self.status = Status::Ended;
            debug!("game drawn");
        } else {
            self.current_player = mark.opponent();
        }
        Ok(())
    }

    /// Snapshot in the client-facing shape.
    pub fn view(&self) -> GameView {
        GameView {
            board: self.board.to_grid(),
            current_player: self.current_player,
            winner: self.winner,
            status: self.status,
            win_positions: self.win_positions.clone(),
        }
    }
}

/// The requested seat is already occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatTaken;
