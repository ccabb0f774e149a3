pub mod board;
pub mod error;
pub mod game;
pub mod ids;
pub mod player;
pub mod snapshot;

pub use board::{Board, Mark, Position};
pub use error::GameError;
pub use game::{Game, GameStatus};
pub use ids::{GameId, PlayerId};
pub use player::Player;
pub use snapshot::GameState;
