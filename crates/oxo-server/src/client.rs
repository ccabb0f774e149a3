use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use oxo_core::GameId;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(90);

/// Unique connection identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClientId(pub String);

impl Default for ClientId {
    fn default() -> Self {
        Self(format!("client_{}", Uuid::now_v7()))
    }
}

impl ClientId {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inbound traffic, funneled from every connection into the single
/// dispatcher loop.
#[derive(Debug)]
pub enum Inbound {
    /// A text frame from a client.
    Frame(ClientId, String),
    /// The connection closed, errored out, or went dead.
    Closed(ClientId),
}

/// A connected WebSocket client and its room membership.
pub struct Client {
    pub id: ClientId,
    /// The match room this connection is in, if any. A connection is in
    /// at most one room.
    pub room: Option<GameId>,
    tx: mpsc::Sender<String>,
    connected: bool,
    last_pong: u64,
}

impl Client {
    fn new(id: ClientId, tx: mpsc::Sender<String>) -> Self {
        Self {
            id,
            room: None,
            tx,
            connected: true,
            last_pong: now_secs(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn record_pong(&mut self) {
        self.last_pong = now_secs();
    }

    fn is_alive(&self) -> bool {
        now_secs().saturating_sub(self.last_pong) < CLIENT_TIMEOUT.as_secs()
    }
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Registry of live connections with room-keyed broadcast.
pub struct ClientRegistry {
    clients: DashMap<ClientId, Arc<Mutex<Client>>>,
    max_send_queue: usize,
}

impl ClientRegistry {
    pub fn new(max_send_queue: usize) -> Self {
        Self {
            clients: DashMap::new(),
            max_send_queue,
        }
    }

    /// Register a new connection and return its id plus the receiving
    /// half of its outbound queue.
    pub fn register(&self) -> (ClientId, mpsc::Receiver<String>) {
        let id = ClientId::new();
        let (tx, rx) = mpsc::channel(self.max_send_queue);
        let client = Arc::new(Mutex::new(Client::new(id.clone(), tx)));
        self.clients.insert(id.clone(), client);
        (id, rx)
    }

    /// Remove a connection by id.
    pub fn unregister(&self, id: &ClientId) {
        if let Some((_, client)) = self.clients.remove(id) {
            client.lock().connected = false;
        }
    }

    /// Put a connection into a match room, replacing any previous
    /// membership.
    pub fn join_room(&self, id: &ClientId, room: GameId) {
        if let Some(client) = self.clients.get(id) {
            client.lock().room = Some(room);
        }
    }

    /// Drop room membership, but only if the connection is currently in
    /// `room`.
    pub fn leave_room(&self, id: &ClientId, room: &GameId) {
        if let Some(client) = self.clients.get(id) {
            let mut client = client.lock();
            if client.room.as_ref() == Some(room) {
                client.room = None;
            }
        }
    }

    /// Send a message to one connection. Messages to a full queue are
    /// dropped with a warning rather than blocking the event loop.
    pub fn send_to(&self, id: &ClientId, message: String) -> bool {
        let Some(client) = self.clients.get(id) else {
            return false;
        };
        let tx = client.lock().tx.clone();
        drop(client);

        match tx.try_send(message) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(msg)) => {
                tracing::warn!(
                    client_id = %id,
                    msg_len = msg.len(),
                    "send queue full, dropping message"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Broadcast to every member of a room, the sender included.
    pub fn broadcast_to_room(&self, room: &GameId, message: &str) {
        for entry in self.clients.iter() {
            let client = entry.value().lock();
            if client.room.as_ref() == Some(room) && client.is_connected() {
                let _ = client.tx.try_send(message.to_string());
            }
        }
    }

    /// Number of live connections.
    pub fn count(&self) -> usize {
        self.clients.len()
    }

    /// Room membership of a connection.
    pub fn room_of(&self, id: &ClientId) -> Option<GameId> {
        self.clients.get(id).and_then(|c| c.lock().room.clone())
    }

    /// Remove connections that stopped answering pings. Returns the ids
    /// removed so their departure can be dispatched.
    pub fn cleanup_dead_clients(&self) -> Vec<ClientId> {
        let dead: Vec<ClientId> = self
            .clients
            .iter()
            .filter_map(|entry| {
                let client = entry.value().lock();
                (!client.is_alive()).then(|| client.id.clone())
            })
            .collect();

        for id in &dead {
            self.unregister(id);
            tracing::info!(client_id = %id, "cleaned up dead client");
        }
        dead
    }
}

/// Handle one WebSocket connection: split into reader/writer tasks,
/// keep the link alive with pings, and push a `Closed` notice into the
/// inbound channel when the connection ends so departure handling runs
/// on the event loop.
pub async fn handle_ws_connection(
    socket: WebSocket,
    client_id: ClientId,
    mut rx: mpsc::Receiver<String>,
    registry: Arc<ClientRegistry>,
    inbound: mpsc::Sender<Inbound>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Writer: forward queued messages plus periodic pings.
    let writer_cid = client_id.clone();
    let writer_registry = Arc::clone(&registry);
    let writer = tokio::spawn(async move {
        let mut ping_interval = tokio::time::interval(HEARTBEAT_INTERVAL);
        ping_interval.tick().await; // consume first immediate tick

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    match msg {
                        Some(text) => {
                            if ws_tx.send(WsMessage::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ping_interval.tick() => {
                    if ws_tx.send(WsMessage::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }

        if let Some(client) = writer_registry.clients.get(&writer_cid) {
            client.lock().connected = false;
        }
    });

    // Reader: forward frames to the dispatcher, track pongs.
    let reader_cid = client_id.clone();
    let reader_registry = Arc::clone(&registry);
    let reader_inbound = inbound.clone();
    let reader = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            match msg {
                WsMessage::Text(text) => {
                    let _ = reader_inbound
                        .send(Inbound::Frame(reader_cid.clone(), text.to_string()))
                        .await;
                }
                WsMessage::Pong(_) => {
                    if let Some(client) = reader_registry.clients.get(&reader_cid) {
                        client.lock().record_pong();
                    }
                }
                WsMessage::Close(_) => break,
                WsMessage::Ping(_) => {} // axum answers pings automatically
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = writer => {},
        _ = reader => {},
    }

    registry.unregister(&client_id);
    let _ = inbound.send(Inbound::Closed(client_id)).await;
}

/// Periodically sweep connections that stopped answering pings, routing
/// each removal through the dispatcher as a disconnect.
pub fn start_cleanup_task(
    registry: Arc<ClientRegistry>,
    interval: Duration,
    inbound: mpsc::Sender<Inbound>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed = registry.cleanup_dead_clients();
            if !removed.is_empty() {
                tracing::info!(removed = removed.len(), "dead client sweep");
            }
            for id in removed {
                let _ = inbound.send(Inbound::Closed(id)).await;
            }
        }
    })
}
