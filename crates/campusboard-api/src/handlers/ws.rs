//! WebSocket upgrade handler for the live connection.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use campusboard_entity::Identity;
use campusboard_realtime::connection::heartbeat::run_heartbeat;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameter for WebSocket authentication.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// Bearer token. Without one the connection is an anonymous viewer.
    pub token: Option<String>,
}

/// GET /ws?token={jwt}
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Result<Response, ApiError> {
    // Authenticate before upgrade
    let identity = match query.token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => Some(state.jwt_decoder.verify(token)?),
        None => None,
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(state, identity, socket)))
}

/// Drives one established connection until either side closes it.
async fn handle_socket(state: AppState, identity: Option<Identity>, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let manager = state.realtime.connections.clone();

    let (handle, mut outbound_rx) = manager.register(identity);
    let conn_id = handle.id;

    info!(
        conn_id = %conn_id,
        user_id = ?handle.user_id(),
        "WebSocket connection established"
    );

    let heartbeat = tokio::spawn(run_heartbeat(
        Arc::clone(&handle),
        state.realtime.heartbeat_config(),
    ));
    let mut shutdown = state.realtime.shutdown_receiver();

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                let Some(frame) = outbound else { break };
                if let Err(e) = ws_tx.send(Message::Text(frame.into())).await {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket send failed");
                    break;
                }
            }
            inbound = ws_rx.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    manager.handle_inbound(&conn_id, text.as_str()).await;
                }
                Some(Ok(Message::Pong(_))) => handle.record_pong().await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            },
            _ = handle.closed() => {
                debug!(conn_id = %conn_id, "Connection closed by server");
                break;
            }
            _ = shutdown.recv() => break,
        }
    }

    handle.mark_dead();
    let _ = ws_tx.send(Message::Close(None)).await;
    heartbeat.abort();
    manager.unregister(&conn_id);

    info!(conn_id = %conn_id, "WebSocket connection closed");
}

