//! Ping/pong heartbeat for live connection keepalive.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time;

use campusboard_core::config::RealtimeConfig;

use super::handle::ConnectionHandle;
use crate::message::types::ServerEvent;

/// Heartbeat configuration
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between pings
    pub ping_interval: Duration,
    /// Timeout before considering connection dead
    pub ping_timeout: Duration,
}

impl From<&RealtimeConfig> for HeartbeatConfig {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            ping_interval: Duration::from_secs(config.ping_interval_seconds.max(1)),
            ping_timeout: Duration::from_secs(config.ping_timeout_seconds.max(1)),
        }
    }
}

/// Run heartbeat loop for a connection.
///
/// Sends periodic pings and closes the connection if no pong arrives
/// within the timeout. Ends when the connection is closed.
pub async fn run_heartbeat(handle: Arc<ConnectionHandle>, config: HeartbeatConfig) {
    let mut interval = time::interval(config.ping_interval);

    loop {
        tokio::select! {
            _ = handle.closed() => break,
            _ = interval.tick() => {}
        }

        if !handle.is_alive() {
            break;
        }

        let silent_for = handle.last_pong().await.elapsed();
        if silent_for > config.ping_timeout {
            tracing::warn!(
                conn_id = %handle.id,
                silent_ms = silent_for.as_millis() as u64,
                "Heartbeat timeout, closing connection"
            );
            handle.close();
            break;
        }

        let ping = ServerEvent::Ping {
            timestamp: Utc::now(),
        };
        let sent = serde_json::to_string(&ping)
            .map(|frame| handle.send(frame))
            .unwrap_or(false);
        if !sent && !handle.is_alive() {
            tracing::debug!(conn_id = %handle.id, "Ping send failed, closing connection");
            handle.close();
            break;
        }
    }

    tracing::debug!(conn_id = %handle.id, "Heartbeat loop ended");
}
