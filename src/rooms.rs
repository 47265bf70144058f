//! Room registry for real-time multicast.
//!
//! One room per game identifier. Delivery is fire-and-forget: events
//! are pushed onto each member's outbound channel and send failures
//! (connection already gone) are ignored.

use crate::game::{GameView, Status};
use crate::session::GameId;
use axum::extract::ws::Message;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, instrument};

/// Sender half of a connection's outbound message channel.
pub type ConnectionSender = mpsc::UnboundedSender<Message>;

/// Events multicast to a game's room.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// The game's state changed.
    GameUpdate(GameView),
    /// A participant left; carries the game's new status.
    PlayerLeft {
        /// Status after the departure.
        status: Status,
    },
    /// Rematch redirect: the room should move to another game.
    SwitchGame {
        /// Identifier of the replacement game.
        #[serde(rename = "gameId")]
        game_id: GameId,
    },
}

/// Registry of rooms, keyed by game identifier.
///
/// Membership is keyed by a per-socket id so several sockets from one
/// client can sit in the same room.
#[derive(Debug, Default)]
pub struct Rooms {
    rooms: DashMap<GameId, HashMap<String, ConnectionSender>>,
}

impl Rooms {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a socket to a room, creating the room if needed.
    #[instrument(skip(self, sender))]
    pub fn join(&self, game_id: &str, socket_id: &str, sender: ConnectionSender) {
        self.rooms
            .entry(game_id.to_string())
            .or_default()
            .insert(socket_id.to_string(), sender);
        debug!(game_id, socket_id, "socket joined room");
    }

    /// Removes a socket from a room, dropping the room when empty.
    #[instrument(skip(self))]
    pub fn leave(&self, game_id: &str, socket_id: &str) {
        let mut emptied = false;
        if let Some(mut room) = self.rooms.get_mut(game_id) {
            room.remove(socket_id);
            emptied = room.is_empty();
        }
        if emptied {
            self.rooms.remove(game_id);
        }
    }

    /// Tears a room down entirely.
    pub fn remove_room(&self, game_id: &str) {
        self.rooms.remove(game_id);
    }

    /// Number of sockets currently in the room.
    pub fn member_count(&self, game_id: &str) -> usize {
        self.rooms.get(game_id).map(|room| room.len()).unwrap_or(0)
    }

    /// Multicasts an event to every socket in the room.
    #[instrument(skip(self, event))]
    pub fn broadcast(&self, game_id: &str, event: &ServerEvent) {
        let Ok(text) = serde_json::to_string(event) else {
            return;
        };
        if let Some(room) = self.rooms.get(game_id) {
            debug!(game_id, members = room.len(), "broadcasting event");
            for sender in room.values() {
                let _ = sender.send(Message::Text(text.clone().into()));
            }
        }
    }
}
