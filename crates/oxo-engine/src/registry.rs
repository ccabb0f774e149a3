use dashmap::DashMap;
use oxo_core::{Game, GameError, GameId, GameState, Player, PlayerId, Position};

/// Owns every live match. Games own their seated players; the registry
/// additionally keeps a reverse index from player id to owning game for
/// departure handling. One instance per process, shared by `Arc` with
/// the dispatcher.
///
/// Lookups return `Option`/`Err` rather than panicking: the deferred
/// cleanup task can delete a match between any two events, so callers
/// must not assume a match still exists.
pub struct GameRegistry {
    games: DashMap<GameId, Game>,
    players: DashMap<PlayerId, GameId>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self {
            games: DashMap::new(),
            players: DashMap::new(),
        }
    }

    /// Create a match with its first player already seated.
    pub fn create_game(&self, player_name: &str) -> Result<(GameId, PlayerId), GameError> {
        let mut game = Game::new();
        let player_id = game.add_player(player_name)?;
        let game_id = game.id().clone();

        self.players.insert(player_id.clone(), game_id.clone());
        self.games.insert(game_id.clone(), game);

        tracing::info!(game_id = %game_id, player_id = %player_id, "game created");
        Ok((game_id, player_id))
    }

    /// Seat a second player and return the post-join snapshot.
    pub fn join_game(
        &self,
        game_id: &GameId,
        player_name: &str,
    ) -> Result<(PlayerId, GameState), GameError> {
        let Some(mut game) = self.games.get_mut(game_id) else {
            tracing::warn!(game_id = %game_id, "join rejected: game not found");
            return Err(GameError::GameNotFound);
        };

        let player_id = match game.add_player(player_name) {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(game_id = %game_id, reason = err.error_kind(), "join rejected");
                return Err(err);
            }
        };
        let snapshot = game.snapshot();
        drop(game);

        self.players.insert(player_id.clone(), game_id.clone());
        tracing::info!(game_id = %game_id, player_id = %player_id, "player joined");
        Ok((player_id, snapshot))
    }

    /// Apply a move and return the resulting snapshot.
    pub fn apply_move(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        position: Position,
    ) -> Result<GameState, GameError> {
        let Some(mut game) = self.games.get_mut(game_id) else {
            tracing::warn!(game_id = %game_id, "move rejected: game not found");
            return Err(GameError::GameNotFound);
        };

        if let Err(err) = game.apply_move(player_id, position) {
            tracing::warn!(
                game_id = %game_id,
                player_id = %player_id,
                reason = err.error_kind(),
                "move rejected"
            );
            return Err(err);
        }

        tracing::info!(game_id = %game_id, player_id = %player_id, "move applied");
        Ok(game.snapshot())
    }

    /// Unseat a player wherever they are seated, deleting the match when
    /// its last player leaves. Unknown players are a no-op.
    pub fn remove_player(&self, player_id: &PlayerId) {
        let Some((_, game_id)) = self.players.remove(player_id) else {
            return;
        };

        if let Some(mut game) = self.games.get_mut(&game_id) {
            game.remove_player(player_id);
            let empty = game.is_empty();
            drop(game);

            if empty {
                self.games.remove(&game_id);
                tracing::info!(game_id = %game_id, "game removed, all players left");
            }
        }

        tracing::info!(player_id = %player_id, "player removed");
    }

    /// Delete a match and every player record seated in it. Idempotent:
    /// a second call for the same id does nothing.
    pub fn cleanup_game(&self, game_id: &GameId) {
        let Some((_, game)) = self.games.remove(game_id) else {
            return;
        };
        for player in game.players() {
            self.players.remove(&player.id);
        }
        tracing::info!(game_id = %game_id, "game cleaned up");
    }

    pub fn snapshot(&self, game_id: &GameId) -> Option<GameState> {
        self.games.get(game_id).map(|game| game.snapshot())
    }

    pub fn player(&self, player_id: &PlayerId) -> Option<Player> {
        let game_id = self.players.get(player_id)?.value().clone();
        let game = self.games.get(&game_id)?;
        game.player(player_id).cloned()
    }

    pub fn player_game(&self, player_id: &PlayerId) -> Option<GameId> {
        self.players.get(player_id).map(|entry| entry.value().clone())
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self::new()
    }
}
