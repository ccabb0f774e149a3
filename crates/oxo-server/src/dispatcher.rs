use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use oxo_core::{GameError, GameId, GameStatus, PlayerId, Position};
use oxo_engine::{schedule_cleanup, GameRegistry};
use tokio::sync::mpsc;

use crate::client::{ClientId, ClientRegistry, Inbound};
use crate::protocol::{ClientEvent, ErrorCode, ServerEvent};

/// Per-connection association with a player and match. Created on the
/// first successful create/join; an explicit leave does not reset it,
/// since the connection is expected to close or restart its flow.
#[derive(Clone, Debug)]
struct ConnSession {
    player_id: PlayerId,
    game_id: GameId,
}

/// Maps inbound frames to registry operations and fans the results back
/// out to the match room.
///
/// All frames from all connections funnel through one channel consumed
/// by a single task, so each event's registry mutation and broadcast
/// complete before the next event is looked at. The deferred cleanup
/// timer is the only work that interleaves; every handler therefore
/// treats a missing game as a quiet no-op rather than a bug.
pub struct Dispatcher {
    registry: Arc<GameRegistry>,
    clients: Arc<ClientRegistry>,
    sessions: DashMap<ClientId, ConnSession>,
    cleanup_delay: Duration,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<GameRegistry>,
        clients: Arc<ClientRegistry>,
        cleanup_delay: Duration,
    ) -> Self {
        Self {
            registry,
            clients,
            sessions: DashMap::new(),
            cleanup_delay,
        }
    }

    /// Consume the inbound channel until every sender is gone.
    pub async fn run(self, mut rx: mpsc::Receiver<Inbound>) {
        while let Some(inbound) = rx.recv().await {
            match inbound {
                Inbound::Frame(client_id, raw) => self.handle_frame(&client_id, &raw),
                Inbound::Closed(client_id) => self.handle_closed(&client_id),
            }
        }
        tracing::info!("inbound channel closed, dispatcher stopping");
    }

    pub(crate) fn handle_frame(&self, client_id: &ClientId, raw: &str) {
        let event = match serde_json::from_str::<ClientEvent>(raw) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(client_id = %client_id, error = %err, "dropping unparseable frame");
                return;
            }
        };
        self.handle_event(client_id, event);
    }

    pub(crate) fn handle_event(&self, client_id: &ClientId, event: ClientEvent) {
        match event {
            ClientEvent::CreateGame { player_name } => self.handle_create(client_id, &player_name),
            ClientEvent::JoinGame {
                game_id,
                player_name,
            } => self.handle_join(client_id, &game_id, &player_name),
            ClientEvent::MakeMove { game_id, position } => {
                self.handle_move(client_id, &game_id, position)
            }
            ClientEvent::CancelGame { game_id } => self.handle_cancel(client_id, &game_id),
            ClientEvent::LeaveGame { game_id } => self.handle_leave(client_id, &game_id),
            ClientEvent::DisconnectGame => self.handle_departure(client_id),
        }
    }

    fn handle_create(&self, client_id: &ClientId, player_name: &str) {
        match self.registry.create_game(player_name) {
            Ok((game_id, player_id)) => {
                self.clients.join_room(client_id, game_id.clone());
                self.sessions.insert(
                    client_id.clone(),
                    ConnSession {
                        player_id,
                        game_id: game_id.clone(),
                    },
                );
                self.send(
                    client_id,
                    &ServerEvent::GameCreated {
                        game_id: game_id.to_string(),
                    },
                );
            }
            Err(err) => {
                tracing::error!(client_id = %client_id, error = %err, "create_game failed");
                self.send(
                    client_id,
                    &ServerEvent::error(ErrorCode::CreateGameError, "Failed to create game"),
                );
            }
        }
    }

    fn handle_join(&self, client_id: &ClientId, game_id: &str, player_name: &str) {
        let game_id = GameId::from_raw(game_id);
        match self.registry.join_game(&game_id, player_name) {
            Ok((player_id, snapshot)) => {
                self.clients.join_room(client_id, game_id.clone());
                self.sessions.insert(
                    client_id.clone(),
                    ConnSession {
                        player_id,
                        game_id: game_id.clone(),
                    },
                );
                self.broadcast(&game_id, &ServerEvent::GameJoined(snapshot));
            }
            Err(err) => {
                let message = match err {
                    GameError::GameNotFound => "Game not found",
                    GameError::GameFull => "Game is full",
                    _ => "Failed to join game",
                };
                self.send(
                    client_id,
                    &ServerEvent::error(ErrorCode::JoinGameError, message),
                );
            }
        }
    }

    fn handle_move(&self, client_id: &ClientId, game_id: &str, position: Position) {
        let Some(player_id) = self.session_player(client_id) else {
            self.send(
                client_id,
                &ServerEvent::error(ErrorCode::InvalidPlayer, "Player not found"),
            );
            return;
        };
        let game_id = GameId::from_raw(game_id);

        match self.registry.apply_move(&game_id, &player_id, position) {
            Ok(snapshot) => {
                if snapshot.status == GameStatus::Finished {
                    let winner = snapshot.winner.clone();
                    self.broadcast(
                        &game_id,
                        &ServerEvent::GameOver {
                            winner,
                            game_state: snapshot,
                        },
                    );
                    let _ = schedule_cleanup(Arc::clone(&self.registry), game_id, self.cleanup_delay);
                } else {
                    self.broadcast(&game_id, &ServerEvent::GameUpdate(snapshot));
                }
            }
            Err(_) => {
                // Rejected moves go back to the mover only; the rest of
                // the room never hears about them.
                self.send(client_id, &ServerEvent::move_error("Invalid move"));
            }
        }
    }

    fn handle_cancel(&self, client_id: &ClientId, game_id: &str) {
        let Some(player_id) = self.session_player(client_id) else {
            self.send(
                client_id,
                &ServerEvent::error(ErrorCode::InvalidPlayer, "Player not found"),
            );
            return;
        };
        let game_id = GameId::from_raw(game_id);

        // The final broadcast is skipped when a pending cleanup already
        // removed the game.
        if let Some(snapshot) = self.registry.snapshot(&game_id) {
            self.broadcast(
                &game_id,
                &ServerEvent::GameOver {
                    winner: None,
                    game_state: snapshot,
                },
            );
        }
        self.registry.cleanup_game(&game_id);
        self.clients.leave_room(client_id, &game_id);
        tracing::info!(game_id = %game_id, player_id = %player_id, "game cancelled");
    }

    fn handle_leave(&self, client_id: &ClientId, game_id: &str) {
        let Some(player_id) = self.session_player(client_id) else {
            return;
        };
        let game_id = GameId::from_raw(game_id);

        self.registry.remove_player(&player_id);
        self.broadcast(
            &game_id,
            &ServerEvent::PlayerLeft {
                player_id: player_id.to_string(),
            },
        );
        self.clients.leave_room(client_id, &game_id);

        if let Some(snapshot) = self.registry.snapshot(&game_id) {
            self.broadcast(&game_id, &ServerEvent::GameUpdate(snapshot));
        }
    }

    /// Departure via `disconnect_game` or transport close: same effect
    /// as a leave, applied to the ids recorded on the connection.
    fn handle_departure(&self, client_id: &ClientId) {
        let Some(session) = self.sessions.get(client_id).map(|s| s.value().clone()) else {
            return;
        };

        self.registry.remove_player(&session.player_id);
        self.broadcast(
            &session.game_id,
            &ServerEvent::PlayerLeft {
                player_id: session.player_id.to_string(),
            },
        );
        if let Some(snapshot) = self.registry.snapshot(&session.game_id) {
            self.broadcast(&session.game_id, &ServerEvent::GameUpdate(snapshot));
        }
    }

    fn handle_closed(&self, client_id: &ClientId) {
        self.handle_departure(client_id);
        self.sessions.remove(client_id);
        tracing::info!(client_id = %client_id, "client disconnected");
    }

    fn session_player(&self, client_id: &ClientId) -> Option<PlayerId> {
        self.sessions.get(client_id).map(|s| s.player_id.clone())
    }

    fn send(&self, client_id: &ClientId, event: &ServerEvent) {
        match serde_json::to_string(event) {
            Ok(json) => {
                self.clients.send_to(client_id, json);
            }
            Err(err) => {
                tracing::error!(event = event.name(), error = %err, "failed to serialize event");
            }
        }
    }

    fn broadcast(&self, game_id: &GameId, event: &ServerEvent) {
        match serde_json::to_string(event) {
            Ok(json) => self.clients.broadcast_to_room(game_id, &json),
            Err(err) => {
                tracing::error!(event = event.name(), error = %err, "failed to serialize event");
            }
        }
    }
}
