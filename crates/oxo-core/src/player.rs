use serde::{Deserialize, Serialize};

use crate::board::Mark;
use crate::ids::{GameId, PlayerId};

/// One connected player. The mark and game back-reference are assigned
/// when the player is seated in a match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub mark: Option<Mark>,
    pub game_id: Option<GameId>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::new(),
            name: name.into(),
            mark: None,
            game_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_player_is_unseated() {
        let player = Player::new("Alice");
        assert_eq!(player.name, "Alice");
        assert!(player.mark.is_none());
        assert!(player.game_id.is_none());
        assert!(player.id.as_str().starts_with("player_"));
    }

    #[test]
    fn players_get_distinct_ids() {
        let a = Player::new("Alice");
        let b = Player::new("Alice");
        assert_ne!(a.id, b.id);
    }
}
