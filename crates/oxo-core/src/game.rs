use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::{Board, Mark, Position};
use crate::error::GameError;
use crate::ids::{GameId, PlayerId};
use crate::player::Player;
use crate::snapshot::GameState;

/// Match lifecycle states. `Finished` is terminal: a finished match
/// accepts no further joins or moves, only deletion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Playing,
    Finished,
}

/// One match from creation to cleanup: the board, up to two seated
/// players in join order, the turn pointer, and the outcome.
#[derive(Clone, Debug)]
pub struct Game {
    id: GameId,
    board: Board,
    players: Vec<Player>,
    current_turn: Option<PlayerId>,
    status: GameStatus,
    winner: Option<PlayerId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Game {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: GameId::new(),
            board: Board::new(),
            players: Vec::new(),
            current_turn: None,
            status: GameStatus::Waiting,
            winner: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &GameId {
        &self.id
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn winner(&self) -> Option<&PlayerId> {
        self.winner.as_ref()
    }

    pub fn current_turn(&self) -> Option<&PlayerId> {
        self.current_turn.as_ref()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == player_id)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Seat a player. The first joiner gets X, the second gets O; the
    /// second join starts the match with the first joiner to move.
    pub fn add_player(&mut self, name: impl Into<String>) -> Result<PlayerId, GameError> {
        if self.status != GameStatus::Waiting || self.players.len() >= 2 {
            return Err(GameError::GameFull);
        }

        let mut player = Player::new(name);
        player.mark = Some(if self.players.is_empty() {
            Mark::X
        } else {
            Mark::O
        });
        player.game_id = Some(self.id.clone());
        let player_id = player.id.clone();
        self.players.push(player);

        if self.players.len() == 2 {
            self.status = GameStatus::Playing;
            self.current_turn = Some(self.players[0].id.clone());
        }

        self.touch();
        Ok(player_id)
    }

    /// Apply a move. A rejected move leaves the match untouched.
    pub fn apply_move(&mut self, player_id: &PlayerId, position: Position) -> Result<(), GameError> {
        if self.status != GameStatus::Playing {
            return Err(GameError::InvalidMove);
        }
        if !self
            .board
            .is_legal_move(self.current_turn.as_ref(), player_id, position)
        {
            return Err(GameError::InvalidMove);
        }

        let mark = self
            .player(player_id)
            .and_then(|p| p.mark)
            .ok_or(GameError::InvalidMove)?;
        self.board.place(position, mark);

        if self.board.winner().is_some() {
            self.status = GameStatus::Finished;
            self.winner = Some(player_id.clone());
            self.current_turn = None;
        } else if self.board.is_full() {
            self.status = GameStatus::Finished;
            self.current_turn = None;
        } else {
            self.current_turn = self
                .players
                .iter()
                .map(|p| &p.id)
                .find(|id| *id != player_id)
                .cloned();
        }

        self.touch();
        Ok(())
    }

    /// Unseat a player. Departure during play forfeits the match to the
    /// remaining player. The winner, once set, is never cleared, even if
    /// the winning player is removed afterwards.
    pub fn remove_player(&mut self, player_id: &PlayerId) {
        let Some(idx) = self.players.iter().position(|p| &p.id == player_id) else {
            return;
        };
        self.players.remove(idx);

        if self.status == GameStatus::Playing {
            self.status = GameStatus::Finished;
            self.current_turn = None;
            if let [remaining] = self.players.as_slice() {
                self.winner = Some(remaining.id.clone());
            }
        }

        self.touch();
    }

    /// Owned read-only projection sent to clients.
    pub fn snapshot(&self) -> GameState {
        GameState {
            game_id: self.id.to_string(),
            board: self.board.render(),
            current_turn: self
                .current_turn
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            player1: self
                .players
                .first()
                .map(|p| p.id.to_string())
                .unwrap_or_default(),
            player2: self
                .players
                .get(1)
                .map(|p| p.id.to_string())
                .unwrap_or_default(),
            status: self.status,
            winner: self.winner.as_ref().map(ToString::to_string),
            player_names: self
                .players
                .iter()
                .map(|p| (p.id.to_string(), p.name.clone()))
                .collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_game() -> (Game, PlayerId, PlayerId) {
        let mut game = Game::new();
        let p1 = game.add_player("Alice").unwrap();
        let p2 = game.add_player("Bob").unwrap();
        (game, p1, p2)
    }

    #[test]
    fn creator_waits_with_mark_x() {
        let mut game = Game::new();
        let p1 = game.add_player("Alice").unwrap();

        assert_eq!(game.status(), GameStatus::Waiting);
        assert!(game.current_turn().is_none());
        assert_eq!(game.player(&p1).unwrap().mark, Some(Mark::X));
        assert_eq!(game.player(&p1).unwrap().game_id.as_ref(), Some(game.id()));
    }

    #[test]
    fn second_join_starts_play_with_first_joiner_to_move() {
        let (game, p1, p2) = playing_game();

        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.current_turn(), Some(&p1));
        assert_eq!(game.player(&p2).unwrap().mark, Some(Mark::O));
    }

    #[test]
    fn third_join_is_rejected() {
        let (mut game, _, _) = playing_game();
        assert_eq!(game.add_player("Carol"), Err(GameError::GameFull));
        assert_eq!(game.players().len(), 2);
    }

    #[test]
    fn moving_out_of_turn_is_rejected_without_mutation() {
        let (mut game, p1, _) = playing_game();
        game.apply_move(&p1, Position::new(0, 0)).unwrap();

        let before = game.snapshot();
        assert_eq!(
            game.apply_move(&p1, Position::new(1, 1)),
            Err(GameError::InvalidMove)
        );
        assert_eq!(game.snapshot().board, before.board);
        assert_eq!(game.snapshot().current_turn, before.current_turn);
    }

    #[test]
    fn turns_alternate_between_players() {
        let (mut game, p1, p2) = playing_game();

        game.apply_move(&p1, Position::new(0, 0)).unwrap();
        assert_eq!(game.current_turn(), Some(&p2));
        game.apply_move(&p2, Position::new(1, 0)).unwrap();
        assert_eq!(game.current_turn(), Some(&p1));
    }

    #[test]
    fn completing_a_row_wins() {
        let (mut game, p1, p2) = playing_game();

        game.apply_move(&p1, Position::new(0, 0)).unwrap();
        game.apply_move(&p2, Position::new(1, 0)).unwrap();
        game.apply_move(&p1, Position::new(0, 1)).unwrap();
        game.apply_move(&p2, Position::new(1, 1)).unwrap();
        game.apply_move(&p1, Position::new(0, 2)).unwrap();

        assert_eq!(game.status(), GameStatus::Finished);
        assert_eq!(game.winner(), Some(&p1));
        assert!(game.current_turn().is_none());
    }

    #[test]
    fn full_board_without_a_line_is_a_draw() {
        let (mut game, p1, p2) = playing_game();

        // X  O  X
        // O  O  X
        // X  X  O
        let moves = [
            (&p1, 0, 0),
            (&p2, 0, 1),
            (&p1, 0, 2),
            (&p2, 1, 0),
            (&p1, 1, 2),
            (&p2, 1, 1),
            (&p1, 2, 1),
            (&p2, 2, 2),
            (&p1, 2, 0),
        ];
        for (player, row, col) in moves {
            game.apply_move(player, Position::new(row, col)).unwrap();
        }

        assert_eq!(game.status(), GameStatus::Finished);
        assert!(game.winner().is_none());
        assert!(game.current_turn().is_none());
    }

    #[test]
    fn departure_during_play_forfeits_to_the_remaining_player() {
        let (mut game, p1, p2) = playing_game();

        game.remove_player(&p2);

        assert_eq!(game.status(), GameStatus::Finished);
        assert_eq!(game.winner(), Some(&p1));
        assert!(game.current_turn().is_none());
        assert_eq!(game.players().len(), 1);
    }

    #[test]
    fn finished_game_rejects_moves_and_joins() {
        let (mut game, p1, p2) = playing_game();
        game.remove_player(&p2);

        assert_eq!(
            game.apply_move(&p1, Position::new(0, 0)),
            Err(GameError::InvalidMove)
        );
        assert_eq!(game.add_player("Carol"), Err(GameError::GameFull));
    }

    #[test]
    fn winner_survives_removal_of_the_winning_player() {
        let (mut game, p1, p2) = playing_game();
        game.remove_player(&p2);
        assert_eq!(game.winner(), Some(&p1));

        game.remove_player(&p1);
        assert_eq!(game.winner(), Some(&p1));
        assert!(game.is_empty());
    }

    #[test]
    fn removing_an_unknown_player_is_a_noop() {
        let (mut game, _, _) = playing_game();
        let before = game.snapshot();
        game.remove_player(&PlayerId::new());
        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.snapshot().player_names, before.player_names);
    }

    #[test]
    fn snapshot_reflects_slots_in_join_order() {
        let (game, p1, p2) = playing_game();
        let state = game.snapshot();

        assert_eq!(state.player1, p1.to_string());
        assert_eq!(state.player2, p2.to_string());
        assert_eq!(state.current_turn, p1.to_string());
        assert_eq!(state.status, GameStatus::Playing);
        assert_eq!(state.player_names.get(p1.as_str()).map(String::as_str), Some("Alice"));
        assert_eq!(state.player_names.get(p2.as_str()).map(String::as_str), Some("Bob"));
        assert!(state.winner.is_none());
    }

    #[test]
    fn snapshot_of_waiting_game_leaves_slots_empty() {
        let mut game = Game::new();
        game.add_player("Alice").unwrap();
        let state = game.snapshot();

        assert_eq!(state.player2, "");
        assert_eq!(state.current_turn, "");
        assert_eq!(state.status, GameStatus::Waiting);
    }
}
