//! Real-time event channel over WebSocket.
//!
//! One persistent connection per client at `GET /ws`. Messages are
//! JSON objects `{"event": ..., "data": ...}` in both directions; a
//! dropped connection is handled like an explicit `leave` for the
//! connection's bound game.

use crate::rooms::ServerEvent;
use crate::server::SharedState;
use crate::session::LeaveOutcome;
use axum::extract::connect_info::ConnectInfo;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Events a client may send over the channel.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Enter a game's room (and bind to a seat if the identity owns one).
    Join {
        /// Game to join.
        #[serde(rename = "gameId")]
        game_id: String,
    },
    /// Leave a game, releasing any held seat.
    Leave {
        /// Game to leave.
        #[serde(rename = "gameId")]
        game_id: String,
    },
    /// Rematch signal: redirect the old room to a new game.
    NewGame {
        /// Room to notify.
        #[serde(rename = "oldGameId")]
        old_game_id: String,
        /// Replacement game id relayed to the room.
        #[serde(rename = "newGameId")]
        new_game_id: String,
    },
}

/// Upgrades the connection and drives the event loop.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<SharedState>,
) -> Response {
    let identity = addr.ip().to_string();
    ws.on_upgrade(move |socket| handle_socket(socket, state, identity))
}

/// Per-connection event loop.
///
/// A forwarder task pumps the outbound channel into the socket so room
/// broadcasts never block on a slow client from the engine's side.
#[instrument(skip(socket, state))]
async fn handle_socket(socket: WebSocket, state: SharedState, identity: String) {
    let socket_id = Uuid::new_v4().to_string();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let forwarder = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    info!(socket_id, identity, "websocket connected");
    let mut joined_rooms: HashSet<String> = HashSet::new();

    while let Some(Ok(message)) = stream.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        match serde_json::from_str::<ClientEvent>(&text) {
            Ok(event) => handle_event(&state, &socket_id, &identity, &tx, &mut joined_rooms, event),
            Err(error) => {
                debug!(socket_id, %error, "ignoring malformed client event");
            }
        }
    }

    // Implicit leave for the connection's bound game, if any.
    match state.sessions.release(&identity) {
        LeaveOutcome::PlayerLeft { game_id, status } => {
            state.rooms.leave(&game_id, &socket_id);
            joined_rooms.remove(&game_id);
            state
                .rooms
                .broadcast(&game_id, &ServerEvent::PlayerLeft { status });
        }
        LeaveOutcome::Removed { game_id } => {
            state.rooms.remove_room(&game_id);
            joined_rooms.remove(&game_id);
        }
        LeaveOutcome::Ignored => {}
    }
    for game_id in joined_rooms {
        state.rooms.leave(&game_id, &socket_id);
    }

    forwarder.abort();
    info!(socket_id, identity, "websocket disconnected");
}

fn handle_event(
    state: &SharedState,
    socket_id: &str,
    identity: &str,
    sender: &crate::rooms::ConnectionSender,
    joined_rooms: &mut HashSet<String>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::Join { game_id } => {
            state.rooms.join(&game_id, socket_id, sender.clone());
            joined_rooms.insert(game_id.clone());
            // Unknown game: stay in the room but emit nothing.
            if let Some(view) = state.sessions.bind_connection(identity, &game_id) {
                state
                    .rooms
                    .broadcast(&game_id, &ServerEvent::GameUpdate(view));
            } else {
                warn!(socket_id, game_id, "join for unknown game");
            }
        }
        ClientEvent::Leave { game_id } => match state.sessions.leave_game(&game_id, identity) {
            LeaveOutcome::PlayerLeft { game_id, status } => {
                state.rooms.leave(&game_id, socket_id);
                joined_rooms.remove(&game_id);
                state
                    .rooms
                    .broadcast(&game_id, &ServerEvent::PlayerLeft { status });
            }
            LeaveOutcome::Removed { game_id } => {
                state.rooms.remove_room(&game_id);
                joined_rooms.remove(&game_id);
            }
            LeaveOutcome::Ignored => {
                // Connection was never a participant; just exit the room.
                state.rooms.leave(&game_id, socket_id);
                joined_rooms.remove(&game_id);
            }
        },
        ClientEvent::NewGame {
            old_game_id,
            new_game_id,
        } => {
            state.rooms.broadcast(
                &old_game_id,
                &ServerEvent::SwitchGame {
                    game_id: new_game_id,
                },
            );
        }
    }
}
