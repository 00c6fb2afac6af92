//! Individual live connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use campusboard_core::types::id::UserId;
use campusboard_entity::Identity;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// A handle to a single live connection.
///
/// Holds the sender for pushing serialized frames to the socket task and
/// the verified identity, if the client presented one.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Verified identity, `None` for anonymous viewers
    pub identity: Option<Identity>,
    /// Sender for outbound frames
    sender: mpsc::Sender<String>,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Last pong received
    last_pong: RwLock<Instant>,
    /// Whether the connection is still alive
    alive: AtomicBool,
    /// Fired once when the connection is closed from the server side
    closed: CancellationToken,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(identity: Option<Identity>, sender: mpsc::Sender<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            identity,
            sender,
            connected_at: now,
            last_pong: RwLock::new(Instant::now()),
            alive: AtomicBool::new(true),
            closed: CancellationToken::new(),
        }
    }

    /// The verified user behind this connection.
    pub fn user_id(&self) -> Option<UserId> {
        self.identity.as_ref().map(|i| i.user_id)
    }

    /// Queue a frame for this connection. Drops it if the buffer is full.
    pub fn send(&self, frame: String) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Send buffer full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark connection as dead
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Mark the connection dead and tell its socket task to stop.
    pub fn close(&self) {
        self.mark_dead();
        self.closed.cancel();
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        self.closed.cancelled().await;
    }

    /// Record a pong response
    pub async fn record_pong(&self) {
        *self.last_pong.write().await = Instant::now();
    }

    /// When the last pong arrived, or when the connection opened
    pub async fn last_pong(&self) -> Instant {
        *self.last_pong.read().await
    }

    /// Get a snapshot of connection info
    pub async fn info(&self, rooms: Vec<String>) -> ConnectionInfo {
        ConnectionInfo {
            id: self.id,
            user_id: self.user_id(),
            connected_at: self.connected_at,
            idle_ms: self.last_pong().await.elapsed().as_millis() as u64,
            rooms,
            alive: self.is_alive(),
        }
    }
}

/// Snapshot of connection info (serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    /// Connection ID
    pub id: ConnectionId,
    /// User ID
    pub user_id: Option<UserId>,
    /// Connected at
    pub connected_at: DateTime<Utc>,
    /// Milliseconds since the last pong
    pub idle_ms: u64,
    /// Joined rooms
    pub rooms: Vec<String>,
    /// Is alive
    pub alive: bool,
}
