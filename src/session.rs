//! Game registry and session lifecycle management.
//!
//! The `SessionManager` exclusively owns every live `Game` plus the
//! join-code and connection-binding maps. Operations return typed
//! outcomes; broadcasting them to rooms is the caller's job, keeping
//! the engine free of transport concerns.

use crate::error::ApiError;
use crate::game::{self, Coord, Game, GameView, Participant, PlayerId, Status};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Unique identifier for a game.
pub type GameId = String;

/// Short human-typable code resolving to a game identifier.
pub type JoinCode = String;

/// Number of derivable join codes.
const CODE_SPACE: u128 = 1_000_000;

/// Requested game mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// One human against the robot.
    Single,
    /// Two humans.
    Double,
}

impl GameMode {
    /// Parses the client-supplied mode string.
    pub fn parse(mode: Option<&str>) -> Result<Self, ApiError> {
        match mode {
            Some("single") => Ok(GameMode::Single),
            Some("double") => Ok(GameMode::Double),
            _ => Err(ApiError::InvalidMode),
        }
    }
}

/// Raw move coordinates as received from a client, prior to validation.
#[derive(Debug, Clone, Copy)]
pub struct RawMove {
    /// Row axis.
    pub x: Option<i64>,
    /// Column axis.
    pub y: Option<i64>,
    /// Pillar axis.
    pub z: Option<i64>,
}

impl RawMove {
    /// Validates presence and range, yielding board coordinates.
    fn validate(self) -> Result<Coord, ApiError> {
        let (x, y, z) = match (self.x, self.y, self.z) {
            (Some(x), Some(y), Some(z)) => (x, y, z),
            _ => return Err(ApiError::MissingCoordinates),
        };
        let x = usize::try_from(x).map_err(|_| ApiError::IllegalMove)?;
        let y = usize::try_from(y).map_err(|_| ApiError::IllegalMove)?;
        let z = usize::try_from(z).map_err(|_| ApiError::IllegalMove)?;
        Ok(Coord::new(x, y, z))
    }
}

/// Outcome of a leave or disconnect, for the dispatcher to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// A participant left but the game lives on; notify the room.
    PlayerLeft {
        /// Game the participant left.
        game_id: GameId,
        /// Status after the departure (always `waiting`).
        status: Status,
    },
    /// Last human gone; game and code removed, room torn down silently.
    Removed {
        /// Game that was removed.
        game_id: GameId,
    },
    /// Unknown game or connection; nothing happened.
    Ignored,
}

/// Owns all live games and their lookup structures.
#[derive(Debug)]
pub struct SessionManager {
    games: DashMap<GameId, Arc<Mutex<Game>>>,
    codes: DashMap<JoinCode, GameId>,
    connections: DashMap<PlayerId, (GameId, game::Mark)>,
    board_size: usize,
}

impl SessionManager {
    /// Creates a registry producing boards of the given side length.
    pub fn new(board_size: usize) -> Self {
        Self {
            games: DashMap::new(),
            codes: DashMap::new(),
            connections: DashMap::new(),
            board_size,
        }
    }

    /// Number of live games.
    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    /// Creates a game and registers its join code.
    #[instrument(skip(self))]
    pub fn create_game(&self, mode: GameMode, requester: &str) -> (GameId, JoinCode) {
        let game = match mode {
            GameMode::Single => Game::new_single(requester.to_string(), self.board_size),
            GameMode::Double => Game::new_double(requester.to_string(), self.board_size),
        };

        let game_id: GameId = Uuid::new_v4().to_string();
        let code = self.derive_code(&game_id);
        self.games
            .insert(game_id.clone(), Arc::new(Mutex::new(game)));
        self.codes.insert(code.clone(), game_id.clone());

        info!(game_id = %game_id, code = %code, ?mode, "created game");
        (game_id, code)
    }

    /// Derives the short join code for a game identifier.
    ///
    /// Pure numeric transform of the uuid; on the rare collision with a
    /// live game's code, probes linearly to the next free code, which
    /// is then stable for this game's lifetime.
    fn derive_code(&self, game_id: &str) -> JoinCode {
        let seed = Uuid::parse_str(game_id)
            .map(|u| u.as_u128())
            .unwrap_or_default();
        let mut n = seed % CODE_SPACE;
        for _ in 0..CODE_SPACE {
            let code = n.to_string();
            if !self.codes.contains_key(&code) {
                return code;
            }
            n = (n + 1) % CODE_SPACE;
        }
        // Code space exhausted; fall back to the full identifier.
        warn!(game_id, "join code space exhausted");
        game_id.to_string()
    }

    /// Binds the requester to the O seat of the game behind `code`.
    ///
    /// Returns the game id and the updated state for broadcast.
    #[instrument(skip(self))]
    pub fn join_game(&self, code: &str, requester: &str) -> Result<(GameId, GameView), ApiError> {
        let game_id = self
            .codes
            .get(code)
            .map(|entry| entry.value().clone())
            .ok_or(ApiError::UnknownCode)?;
        let entry = self.games.get(&game_id).ok_or(ApiError::UnknownCode)?;
        let mut game = entry.value().lock().unwrap();

        game.join_second(requester.to_string())
            .map_err(|_| ApiError::GameFull)?;

        info!(game_id = %game_id, requester, "second player joined");
        Ok((game_id.clone(), game.view()))
    }

    /// Validates and applies a move, cascading the robot's reply.
    ///
    /// Validation order: unknown game, then authorization, then missing
    /// coordinates, then move legality. On success, if the game is
    /// still active and the next turn belongs to the robot, the robot
    /// moves within the same call. Returns the final state for a
    /// single broadcast.
    #[instrument(skip(self))]
    pub fn submit_move(
        &self,
        game_id: &str,
        requester: &str,
        raw: RawMove,
    ) -> Result<GameView, ApiError> {
        let entry = self.games.get(game_id).ok_or(ApiError::GameNotFound)?;
        let mut game = entry.value().lock().unwrap();

        // Authorization: the mark on turn must be the requester's, or
        // the robot's (robot turns are driven below, never by clients).
        match game.participant(game.current_player()) {
            Some(Participant::Human(id)) if id == requester => {}
            Some(Participant::Robot) => {}
            _ => {
                warn!(game_id, requester, "move rejected: not requester's turn");
                return Err(ApiError::Forbidden);
            }
        }

        let coord = raw.validate()?;
        game.make_move(coord).map_err(|error| {
            warn!(game_id, requester, %error, "move rejected");
            ApiError::IllegalMove
        })?;

        if game.status() == Status::Active
            && game.participant(game.current_player()) == Some(&Participant::Robot)
        {
            let mark = game.current_player();
            match game::choose_move(game.board(), game.lines(), mark) {
                Some(reply) => {
                    if let Err(error) = game.make_move(reply) {
                        warn!(game_id, %error, "robot selected an unplayable cell");
                    }
                }
                None => debug!(game_id, "no legal cell left for robot"),
            }
        }

        info!(game_id, requester, status = ?game.status(), "move applied");
        Ok(game.view())
    }

    /// Current state of a game.
    pub fn game_view(&self, game_id: &str) -> Result<GameView, ApiError> {
        let entry = self.games.get(game_id).ok_or(ApiError::GameNotFound)?;
        let game = entry.value().lock().unwrap();
        Ok(game.view())
    }

    /// Records the connection's mark if its identity owns a seat, and
    /// promotes a waiting game with a full roster to active.
    ///
    /// Returns the current state for a room emit, or `None` for an
    /// unknown game (silent no-op on the real-time channel).
    #[instrument(skip(self))]
    pub fn bind_connection(&self, identity: &str, game_id: &str) -> Option<GameView> {
        let entry = self.games.get(game_id)?;
        let mut game = entry.value().lock().unwrap();

        if let Some(mark) = game.seat_of(identity) {
            debug!(identity, game_id, ?mark, "connection bound to seat");
            self.connections
                .insert(identity.to_string(), (game_id.to_string(), mark));
        }
        game.activate_if_full();
        Some(game.view())
    }

    /// Releases the identity's seat in the given game.
    ///
    /// Idempotent: unknown games and unbound identities are no-ops.
    #[instrument(skip(self))]
    pub fn leave_game(&self, game_id: &str, identity: &str) -> LeaveOutcome {
        self.connections.remove(identity);

        let Some(entry) = self.games.get(game_id) else {
            return LeaveOutcome::Ignored;
        };
        let mut game = entry.value().lock().unwrap();
        game.vacate(identity);

        if game.humans_remaining() == 0 {
            drop(game);
            drop(entry);
            self.remove_game(game_id);
            info!(game_id, "game fully vacated and removed");
            return LeaveOutcome::Removed {
                game_id: game_id.to_string(),
            };
        }

        game.set_waiting();
        info!(game_id, identity, "participant left");
        LeaveOutcome::PlayerLeft {
            game_id: game_id.to_string(),
            status: game.status(),
        }
    }

    /// Resolves a dropped connection to its game and releases its seat.
    #[instrument(skip(self))]
    pub fn release(&self, identity: &str) -> LeaveOutcome {
        let Some((_, (game_id, _))) = self.connections.remove(identity) else {
            return LeaveOutcome::Ignored;
        };
        self.leave_game(&game_id, identity)
    }

    /// Removes a game together with its code and connection entries.
    fn remove_game(&self, game_id: &str) {
        self.games.remove(game_id);
        self.codes.retain(|_, id| id.as_str() != game_id);
        self.connections
            .retain(|_, (id, _)| id.as_str() != game_id);
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(game::DEFAULT_BOARD_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Mark;

    fn raw(x: i64, y: i64, z: i64) -> RawMove {
        RawMove {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(GameMode::parse(Some("single")).unwrap(), GameMode::Single);
        assert_eq!(GameMode::parse(Some("double")).unwrap(), GameMode::Double);
        assert_eq!(GameMode::parse(Some("triple")), Err(ApiError::InvalidMode));
        assert_eq!(GameMode::parse(None), Err(ApiError::InvalidMode));
    }

    #[test]
    fn test_create_single_game_is_active() {
        let sessions = SessionManager::default();
        let (game_id, code) = sessions.create_game(GameMode::Single, "1.2.3.4");
        assert!(code.parse::<u64>().is_ok());

        let view = sessions.game_view(&game_id).unwrap();
        assert_eq!(view.status, Status::Active);
        assert_eq!(view.current_player, Mark::X);
    }

    #[test]
    fn test_create_double_game_waits_for_join() {
        let sessions = SessionManager::default();
        let (game_id, code) = sessions.create_game(GameMode::Double, "1.2.3.4");
        assert_eq!(sessions.game_view(&game_id).unwrap().status, Status::Waiting);

        let (joined_id, view) = sessions.join_game(&code, "5.6.7.8").unwrap();
        assert_eq!(joined_id, game_id);
        assert_eq!(view.status, Status::Active);

        // Third participant bounces
        assert_eq!(
            sessions.join_game(&code, "9.9.9.9").unwrap_err(),
            ApiError::GameFull
        );
    }

    #[test]
    fn test_join_unknown_code() {
        let sessions = SessionManager::default();
        assert_eq!(
            sessions.join_game("000000", "1.2.3.4").unwrap_err(),
            ApiError::UnknownCode
        );
    }

    #[test]
    fn test_join_single_game_is_full() {
        let sessions = SessionManager::default();
        let (_, code) = sessions.create_game(GameMode::Single, "1.2.3.4");
        assert_eq!(
            sessions.join_game(&code, "5.6.7.8").unwrap_err(),
            ApiError::GameFull
        );
    }

    #[test]
    fn test_move_validation_order() {
        let sessions = SessionManager::default();
        let (game_id, _) = sessions.create_game(GameMode::Single, "1.2.3.4");

        // Unknown game first
        assert_eq!(
            sessions
                .submit_move("nope", "1.2.3.4", raw(0, 0, 0))
                .unwrap_err(),
            ApiError::GameNotFound
        );
        // Authorization before coordinate checks
        let missing = RawMove {
            x: None,
            y: Some(0),
            z: Some(0),
        };
        assert_eq!(
            sessions
                .submit_move(&game_id, "9.9.9.9", missing)
                .unwrap_err(),
            ApiError::Forbidden
        );
        // Missing coordinates for the seated player
        assert_eq!(
            sessions
                .submit_move(&game_id, "1.2.3.4", missing)
                .unwrap_err(),
            ApiError::MissingCoordinates
        );
        // Board untouched by all of the above
        let view = sessions.game_view(&game_id).unwrap();
        assert!(view.board.iter().flatten().flatten().all(|c| c.is_none()));
    }

    #[test]
    fn test_negative_coordinates_are_illegal() {
        let sessions = SessionManager::default();
        let (game_id, _) = sessions.create_game(GameMode::Single, "1.2.3.4");
        assert_eq!(
            sessions
                .submit_move(&game_id, "1.2.3.4", raw(-1, 0, 0))
                .unwrap_err(),
            ApiError::IllegalMove
        );
    }

    #[test]
    fn test_robot_replies_within_move() {
        let sessions = SessionManager::default();
        let (game_id, _) = sessions.create_game(GameMode::Single, "1.2.3.4");

        let view = sessions
            .submit_move(&game_id, "1.2.3.4", raw(0, 0, 0))
            .unwrap();
        // Human X moved and the robot answered; X is on turn again
        let marks: usize = view
            .board
            .iter()
            .flatten()
            .flatten()
            .filter(|c| c.is_some())
            .count();
        assert_eq!(marks, 2);
        assert_eq!(view.current_player, Mark::X);
        assert_eq!(view.status, Status::Active);
    }

    #[test]
    fn test_no_robot_cascade_in_double_game() {
        let sessions = SessionManager::default();
        let (game_id, code) = sessions.create_game(GameMode::Double, "1.2.3.4");
        sessions.join_game(&code, "5.6.7.8").unwrap();

        let view = sessions
            .submit_move(&game_id, "1.2.3.4", raw(0, 0, 0))
            .unwrap();
        assert_eq!(view.current_player, Mark::O);
        let marks: usize = view
            .board
            .iter()
            .flatten()
            .flatten()
            .filter(|c| c.is_some())
            .count();
        assert_eq!(marks, 1);
    }

    #[test]
    fn test_leave_sets_waiting_then_removes() {
        let sessions = SessionManager::default();
        let (game_id, code) = sessions.create_game(GameMode::Double, "1.2.3.4");
        sessions.join_game(&code, "5.6.7.8").unwrap();

        let outcome = sessions.leave_game(&game_id, "5.6.7.8");
        assert_eq!(
            outcome,
            LeaveOutcome::PlayerLeft {
                game_id: game_id.clone(),
                status: Status::Waiting,
            }
        );

        let outcome = sessions.leave_game(&game_id, "1.2.3.4");
        assert_eq!(
            outcome,
            LeaveOutcome::Removed {
                game_id: game_id.clone(),
            }
        );
        assert_eq!(sessions.game_count(), 0);

        // The code no longer resolves once the game is gone
        assert_eq!(
            sessions.join_game(&code, "5.6.7.8").unwrap_err(),
            ApiError::UnknownCode
        );
    }

    #[test]
    fn test_leave_is_idempotent() {
        let sessions = SessionManager::default();
        assert_eq!(
            sessions.leave_game("nope", "1.2.3.4"),
            LeaveOutcome::Ignored
        );
        assert_eq!(sessions.release("1.2.3.4"), LeaveOutcome::Ignored);
        assert_eq!(sessions.release("1.2.3.4"), LeaveOutcome::Ignored);
    }

    #[test]
    fn test_release_resolves_bound_connection() {
        let sessions = SessionManager::default();
        let (game_id, code) = sessions.create_game(GameMode::Double, "1.2.3.4");
        sessions.join_game(&code, "5.6.7.8").unwrap();
        sessions.bind_connection("5.6.7.8", &game_id).unwrap();

        let outcome = sessions.release("5.6.7.8");
        assert_eq!(
            outcome,
            LeaveOutcome::PlayerLeft {
                game_id: game_id.clone(),
                status: Status::Waiting,
            }
        );
        // Seat is free again; a new player can join
        sessions.join_game(&code, "9.9.9.9").unwrap();
    }

    #[test]
    fn test_bind_connection_unknown_game_is_silent() {
        let sessions = SessionManager::default();
        assert!(sessions.bind_connection("1.2.3.4", "nope").is_none());
    }

    #[test]
    fn test_single_player_leave_removes_game() {
        let sessions = SessionManager::default();
        let (game_id, _) = sessions.create_game(GameMode::Single, "1.2.3.4");
        let outcome = sessions.leave_game(&game_id, "1.2.3.4");
        assert_eq!(outcome, LeaveOutcome::Removed { game_id });
        assert_eq!(sessions.game_count(), 0);
    }

    #[test]
    fn test_code_collision_probes_to_next_free() {
        let sessions = SessionManager::default();
        // 0x3e8 = 1000
        let colliding = "00000000-0000-0000-0000-0000000003e8";
        sessions
            .codes
            .insert("1000".to_string(), "other-game".to_string());
        assert_eq!(sessions.derive_code(colliding), "1001");
    }

    #[test]
    fn test_codes_unique_across_games() {
        let sessions = SessionManager::default();
        let mut codes = std::collections::HashSet::new();
        for _ in 0..64 {
            let (_, code) = sessions.create_game(GameMode::Double, "1.2.3.4");
            assert!(codes.insert(code));
        }
    }
}
