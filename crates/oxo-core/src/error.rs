/// Typed failures for match lifecycle operations. Everything here is an
/// expected rejection, reported back to the triggering client only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("game not found")]
    GameNotFound,
    #[error("game is full")]
    GameFull,
    #[error("invalid move")]
    InvalidMove,
}

impl GameError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::GameNotFound => "game_not_found",
            Self::GameFull => "game_full",
            Self::InvalidMove => "invalid_move",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(GameError::GameNotFound.to_string(), "game not found");
        assert_eq!(GameError::GameFull.to_string(), "game is full");
        assert_eq!(GameError::InvalidMove.to_string(), "invalid move");
    }

    #[test]
    fn error_kind_strings() {
        assert_eq!(GameError::GameNotFound.error_kind(), "game_not_found");
        assert_eq!(GameError::InvalidMove.error_kind(), "invalid_move");
    }
}
