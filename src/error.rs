//! Client-facing error taxonomy for the HTTP surface.
//!
//! Every variant is a client-input error surfaced synchronously; none
//! are retried and none abort the process. Rejected operations leave
//! prior state untouched.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use derive_more::{Display, Error};
use serde_json::json;

/// Errors returned to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum ApiError {
    /// Game mode was neither `single` nor `double`.
    #[display("Invalid game type.")]
    InvalidMode,
    /// Join code does not resolve to a live game.
    #[display("Invalid game code")]
    UnknownCode,
    /// Second seat already bound.
    #[display("Game already full")]
    GameFull,
    /// Game identifier not in the registry.
    #[display("Game not found")]
    GameNotFound,
    /// Requester does not own the mark whose turn it is.
    #[display("Not your turn.")]
    Forbidden,
    /// Move request missing one or more coordinates.
    #[display("Missing coordinates")]
    MissingCoordinates,
    /// Out of bounds, occupied cell, or game not active.
    #[display("Invalid move")]
    IllegalMove,
}

impl ApiError {
    /// HTTP status carried by this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidMode | ApiError::UnknownCode | ApiError::GameNotFound => {
                StatusCode::NOT_FOUND
            }
            ApiError::GameFull | ApiError::MissingCoordinates | ApiError::IllegalMove => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
