use std::sync::Arc;
use std::time::Duration;

use oxo_core::GameId;

use crate::registry::GameRegistry;

/// Grace period between a match finishing and its teardown, leaving
/// clients time to render the final state.
pub const DEFAULT_CLEANUP_DELAY: Duration = Duration::from_secs(5);

/// Schedule a finished match for teardown after `delay`. The timer is
/// fire-and-forget: it is never cancelled, so events racing it must
/// tolerate the match disappearing underneath them.
pub fn schedule_cleanup(
    registry: Arc<GameRegistry>,
    game_id: GameId,
    delay: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        tracing::debug!(game_id = %game_id, "deferred cleanup firing");
        registry.cleanup_game(&game_id);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished_game(registry: &GameRegistry) -> GameId {
        let (game_id, _) = registry.create_game("Alice").unwrap();
        let (p2, _) = registry.join_game(&game_id, "Bob").unwrap();
        registry.remove_player(&p2);
        game_id
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_fires_after_the_delay() {
        let registry = Arc::new(GameRegistry::new());
        let game_id = finished_game(&registry);

        let handle = schedule_cleanup(
            Arc::clone(&registry),
            game_id.clone(),
            Duration::from_secs(5),
        );

        assert!(registry.snapshot(&game_id).is_some());
        handle.await.unwrap();
        assert!(registry.snapshot(&game_id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_tolerates_the_game_already_being_gone() {
        let registry = Arc::new(GameRegistry::new());
        let game_id = finished_game(&registry);

        let handle = schedule_cleanup(
            Arc::clone(&registry),
            game_id.clone(),
            Duration::from_secs(5),
        );

        // An explicit cancel can race the pending timer.
        registry.cleanup_game(&game_id);
        handle.await.unwrap();
        assert!(registry.snapshot(&game_id).is_none());
    }
}
