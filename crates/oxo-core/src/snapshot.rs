use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::GameStatus;

/// Read-only projection of a match, serialized with the camelCase keys
/// clients consume. Holds no references into the aggregate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub game_id: String,
    /// 3x3 rows of "", "X" or "O".
    pub board: Vec<Vec<String>>,
    /// Player id of the turn holder, or "" when no move is expected.
    pub current_turn: String,
    pub player1: String,
    pub player2: String,
    pub status: GameStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    pub player_names: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
