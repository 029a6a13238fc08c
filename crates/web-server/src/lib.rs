// In crates/web-server/src/lib.rs

use app_config::ServerSettings;
use axum::{
    Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Json},
    routing::get,
};
use core_types::{IndicatorSnapshot, InstrumentId};
use engine::SnapshotCache;
use events::WsMessage;
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};

pub mod error;
pub mod types;

// Re-export our custom error type for convenience.
pub use error::{Error, Result};
pub use types::{ReplayCache, SnapshotEntry, WS_CACHE_SIZE};

/// The shared application state that is available to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub ws_tx: broadcast::Sender<WsMessage>,
    pub ws_cache: Arc<ReplayCache>,
    pub snapshots: Arc<SnapshotCache>,
}

/// Creates the main application router with all routes and middleware.
pub fn create_router(app_state: AppState) -> Router {
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let api_router = Router::new()
        .route("/snapshots", get(get_snapshots_handler))
        .route("/snapshots/{instrumentId}", get(get_snapshot_handler));

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_check_handler))
        .nest("/api", api_router)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

async fn health_check_handler() -> &'static str {
    "OK"
}

/// Handler for `GET /api/snapshots`.
async fn get_snapshots_handler(State(state): State<AppState>) -> Json<Vec<SnapshotEntry>> {
    let entries = state
        .snapshots
        .all()
        .into_iter()
        .map(|(instrument_id, snapshot)| SnapshotEntry { instrument_id, snapshot })
        .collect();
    Json(entries)
}

/// Handler for `GET /api/snapshots/{instrumentId}`.
async fn get_snapshot_handler(
    State(state): State<AppState>,
    Path(instrument_id): Path<String>,
) -> Result<Json<IndicatorSnapshot>> {
    let id = InstrumentId::new(instrument_id);
    state
        .snapshots
        .find(&id)
        .map(Json)
        .ok_or_else(|| Error::NotFound(format!("no snapshot for instrument {id}")))
}

/// The handler for `GET /ws`.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Replays the cache, then streams live broadcast messages until the client leaves.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    tracing::info!("New WebSocket client connected.");

    // Subscribe before replaying so nothing published meanwhile is lost.
    let mut rx = state.ws_tx.subscribe();

    for msg in state.ws_cache.messages() {
        if !send_json(&mut socket, &msg).await {
            tracing::info!("WebSocket client disconnected during replay.");
            return;
        }
    }

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(msg) => {
                    if !send_json(&mut socket, &msg).await {
                        tracing::info!("WebSocket client disconnected.");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "WebSocket client lagging; messages dropped.");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("WebSocket client sent close frame.");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "WebSocket receive error.");
                    break;
                }
            },
        }
    }
    tracing::info!("WebSocket client connection closed.");
}

async fn send_json(socket: &mut WebSocket, msg: &WsMessage) -> bool {
    let json_msg = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize broadcast message.");
            return true;
        }
    };
    socket.send(Message::Text(json_msg.into())).await.is_ok()
}

/// Copies every non-log broadcast message into the replay cache.
///
/// Log lines are cached by the tracing layer that produces them.
pub fn spawn_cache_recorder(ws_tx: &broadcast::Sender<WsMessage>, cache: Arc<ReplayCache>) -> tokio::task::JoinHandle<()> {
    let mut rx = ws_tx.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(WsMessage::Log(_)) => {}
                Ok(msg) => cache.push(msg),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Replay cache recorder lagged.");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Binds the relay server and serves until `shutdown` fires.
pub async fn run(settings: ServerSettings, app_state: AppState, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let app = create_router(app_state);

    let address = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&address).await.map_err(Error::ServerBindError)?;
    tracing::info!("Web server listening on {}", address);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await
        .map_err(Error::ServeError)?;

    Ok(())
}
