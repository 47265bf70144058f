//! HTTP routing and request handlers.

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::game::GameView;
use crate::rooms::{Rooms, ServerEvent};
use crate::session::{GameId, GameMode, JoinCode, RawMove, SessionManager};
use crate::ws;
use axum::extract::connect_info::ConnectInfo;
use axum::extract::{Path, State};
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::instrument;

/// Shared application state: the session registry and room dispatcher.
#[derive(Debug)]
pub struct AppState {
    /// Registry of live games.
    pub sessions: SessionManager,
    /// Broadcast rooms, one per game.
    pub rooms: Rooms,
}

impl AppState {
    /// Builds state from configuration.
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            sessions: SessionManager::new(config.board_size),
            rooms: Rooms::new(),
        }
    }
}

/// Handle to the shared state, cloned into every handler.
pub type SharedState = Arc<AppState>;

/// Builds the application router.
///
/// Separated from `main` so tests can drive it directly.
pub fn app(state: SharedState, config: &ServerConfig) -> Router {
    let cors = cors_layer(config);

    Router::new()
        .route("/api/game/new", post(new_game))
        .route("/api/game/join", post(join_game))
        .route("/api/game/{game_id}/move", post(submit_move))
        .route("/api/game/{game_id}/state", get(game_state))
        .route("/ws", get(ws::ws_handler))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    match config
        .cors_origin
        .as_deref()
        .and_then(|origin| origin.parse::<HeaderValue>().ok())
    {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}

#[derive(Debug, Deserialize)]
struct NewGameRequest {
    mode: Option<String>,
}

#[derive(Debug, Serialize)]
struct NewGameResponse {
    #[serde(rename = "gameId")]
    game_id: GameId,
    #[serde(rename = "joinCode")]
    join_code: JoinCode,
}

#[derive(Debug, Deserialize)]
struct JoinGameRequest {
    code: Option<String>,
}

#[derive(Debug, Serialize)]
struct JoinGameResponse {
    #[serde(rename = "gameId")]
    game_id: GameId,
}

#[derive(Debug, Deserialize)]
struct MoveRequest {
    x: Option<i64>,
    y: Option<i64>,
    z: Option<i64>,
}

#[derive(Debug, Serialize)]
struct MoveResponse {
    success: bool,
}

#[instrument(skip(state, req))]
async fn new_game(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<NewGameRequest>,
) -> Result<Json<NewGameResponse>, ApiError> {
    let mode = GameMode::parse(req.mode.as_deref())?;
    let (game_id, join_code) = state.sessions.create_game(mode, &addr.ip().to_string());
    Ok(Json(NewGameResponse { game_id, join_code }))
}

#[instrument(skip(state, req))]
async fn join_game(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<JoinGameRequest>,
) -> Result<Json<JoinGameResponse>, ApiError> {
    let code = req.code.as_deref().unwrap_or_default();
    let (game_id, update) = state.sessions.join_game(code, &addr.ip().to_string())?;
    state
        .rooms
        .broadcast(&game_id, &ServerEvent::GameUpdate(update));
    Ok(Json(JoinGameResponse { game_id }))
}

#[instrument(skip(state, req))]
async fn submit_move(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let raw = RawMove {
        x: req.x,
        y: req.y,
        z: req.z,
    };
    let update = state
        .sessions
        .submit_move(&game_id, &addr.ip().to_string(), raw)?;
    state
        .rooms
        .broadcast(&game_id, &ServerEvent::GameUpdate(update));
    Ok(Json(MoveResponse { success: true }))
}

#[instrument(skip(state))]
async fn game_state(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
) -> Result<Json<GameView>, ApiError> {
    Ok(Json(state.sessions.game_view(&game_id)?))
}
