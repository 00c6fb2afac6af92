//! Top-level real-time engine that ties together the bus and the emitter.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use campusboard_core::config::RealtimeConfig;

use crate::connection::heartbeat::HeartbeatConfig;
use crate::connection::manager::ConnectionManager;
use crate::emitter::EventEmitter;

/// Central real-time engine shared by HTTP handlers and socket tasks.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection manager (the event bus).
    pub connections: Arc<ConnectionManager>,
    /// Domain write → push event translation.
    pub emitter: Arc<EventEmitter>,
    heartbeat: HeartbeatConfig,
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("connections", &self.connections.connection_count())
            .finish()
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine.
    pub fn new(config: RealtimeConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let heartbeat = HeartbeatConfig::from(&config);
        let connections = Arc::new(ConnectionManager::new(config));
        let emitter = Arc::new(EventEmitter::new(connections.clone()));

        info!("Real-time engine initialized");

        Self {
            connections,
            emitter,
            heartbeat,
            shutdown_tx,
        }
    }

    /// Heartbeat timing for new connections.
    pub fn heartbeat_config(&self) -> HeartbeatConfig {
        self.heartbeat.clone()
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signals socket tasks to stop and closes every connection.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        let _ = self.shutdown_tx.send(());
        self.connections.close_all();
        info!("Real-time engine shut down");
    }
}
