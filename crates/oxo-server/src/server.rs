use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use oxo_engine::GameRegistry;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;

use crate::client::{self, ClientRegistry, Inbound};
use crate::dispatcher::Dispatcher;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    /// Port to bind; 0 picks a free port.
    pub port: u16,
    /// Allowed CORS origin; "*" allows any.
    pub cors_origin: String,
    pub max_send_queue: usize,
    /// Grace period between a match finishing and its teardown.
    pub cleanup_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origin: "*".to_string(),
            max_send_queue: 256,
            cleanup_delay: oxo_engine::DEFAULT_CLEANUP_DELAY,
        }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub client_registry: Arc<ClientRegistry>,
    pub inbound_tx: mpsc::Sender<Inbound>,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(cors_layer(cors_origin))
}

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<axum::http::HeaderValue>() {
        Ok(value) => CorsLayer::new().allow_origin(value),
        Err(_) => {
            tracing::warn!(origin, "invalid CORS origin, falling back to permissive");
            CorsLayer::permissive()
        }
    }
}

/// Create and start the server. The returned handle keeps the serve,
/// dispatch, and heartbeat-sweep tasks alive.
pub async fn start(
    config: ServerConfig,
    registry: Arc<GameRegistry>,
) -> Result<ServerHandle, std::io::Error> {
    let client_registry = Arc::new(ClientRegistry::new(config.max_send_queue));
    let (inbound_tx, inbound_rx) = mpsc::channel::<Inbound>(1024);

    let dispatcher = Dispatcher::new(
        registry,
        Arc::clone(&client_registry),
        config.cleanup_delay,
    );
    let dispatch_handle = tokio::spawn(dispatcher.run(inbound_rx));

    let sweep_handle = client::start_cleanup_task(
        Arc::clone(&client_registry),
        Duration::from_secs(60),
        inbound_tx.clone(),
    );

    let state = AppState {
        client_registry,
        inbound_tx,
    };
    let router = build_router(state, &config.cors_origin);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(host = %config.host, port = local_addr.port(), "game server started");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        _server: server_handle,
        _dispatch: dispatch_handle,
        _sweep: sweep_handle,
    })
}

/// Handle returned by `start()`. Dropping it tears the server down.
pub struct ServerHandle {
    pub port: u16,
    _server: tokio::task::JoinHandle<()>,
    _dispatch: tokio::task::JoinHandle<()>,
    _sweep: tokio::task::JoinHandle<()>,
}

/// WebSocket upgrade handler.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a new WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (client_id, rx) = state.client_registry.register();
    tracing::info!(client_id = %client_id, "client connected");

    client::handle_ws_connection(
        socket,
        client_id,
        rx,
        state.client_registry,
        state.inbound_tx,
    )
    .await;
}

/// Liveness probe. Always "ok", independent of match state.
async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({ "status": "ok" }))
}
