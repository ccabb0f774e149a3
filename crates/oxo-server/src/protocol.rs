//! Wire protocol for the game socket.
//!
//! Frames are JSON objects `{"event": <name>, "data": <payload>}` in
//! both directions. Event names are snake_case; payload keys are
//! camelCase, matching what browser clients bind handlers to.

use oxo_core::{GameState, Position};
use serde::{Deserialize, Serialize};

/// Client-to-server events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    CreateGame { player_name: String },
    #[serde(rename_all = "camelCase")]
    JoinGame {
        game_id: String,
        player_name: String,
    },
    #[serde(rename_all = "camelCase")]
    MakeMove { game_id: String, position: Position },
    #[serde(rename_all = "camelCase")]
    CancelGame { game_id: String },
    #[serde(rename_all = "camelCase")]
    LeaveGame { game_id: String },
    /// Explicit client-side disconnect; the transport-level close is
    /// handled the same way.
    DisconnectGame,
}

/// Server-to-client events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    GameCreated { game_id: String },
    GameJoined(GameState),
    GameUpdate(GameState),
    #[serde(rename_all = "camelCase")]
    GameOver {
        #[serde(skip_serializing_if = "Option::is_none")]
        winner: Option<String>,
        game_state: GameState,
    },
    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: String },
    MoveError { message: String },
    Error { message: String, code: ErrorCode },
}

impl ServerEvent {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            code,
        }
    }

    pub fn move_error(message: impl Into<String>) -> Self {
        Self::MoveError {
            message: message.into(),
        }
    }

    /// Event name as it appears on the wire, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GameCreated { .. } => "game_created",
            Self::GameJoined(_) => "game_joined",
            Self::GameUpdate(_) => "game_update",
            Self::GameOver { .. } => "game_over",
            Self::PlayerLeft { .. } => "player_left",
            Self::MoveError { .. } => "move_error",
            Self::Error { .. } => "error",
        }
    }
}

/// Stable machine codes attached to `error` events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    CreateGameError,
    JoinGameError,
    InvalidPlayer,
    MoveError,
    CancelGameError,
    LeaveGameError,
}
