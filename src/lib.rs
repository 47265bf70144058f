//! Qubic server - three-dimensional tic-tac-toe over HTTP and WebSocket.
//!
//! # Architecture
//!
//! - **Game**: cubic board, win detection, state machine, robot policy
//! - **Session**: registry of live games, join codes, connection bindings
//! - **Rooms**: per-game multicast of state changes to WebSocket clients
//! - **Server**: axum router exposing the REST surface and `/ws`
//!
//! The engine (game + session) never talks to the transport: operations
//! return views and outcomes, and the HTTP/WS layer dispatches them to
//! rooms.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod error;
mod game;
mod rooms;
mod server;
mod session;
mod ws;

// Crate-level exports - Configuration
pub use config::ServerConfig;

// Crate-level exports - Error taxonomy
pub use error::ApiError;

// Crate-level exports - Game engine
pub use game::{
    Board, Coord, DEFAULT_BOARD_SIZE, Game, GameView, LineSet, Mark, MoveError, Participant,
    PlayerId, PlayerKind, Status, Winner, choose_move,
};

// Crate-level exports - Rooms and events
pub use rooms::{ConnectionSender, Rooms, ServerEvent};

// Crate-level exports - HTTP surface
pub use server::{AppState, SharedState, app};

// Crate-level exports - Session management
pub use session::{GameId, GameMode, JoinCode, LeaveOutcome, RawMove, SessionManager};

// Crate-level exports - Real-time channel
pub use ws::ClientEvent;
