//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use campusboard_auth::JwtDecoder;
use campusboard_core::config::AppConfig;
use campusboard_database::DatabasePool;
use campusboard_realtime::RealtimeEngine;
use campusboard_service::Services;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// PostgreSQL pool, absent with the memory store
    pub db_pool: Option<DatabasePool>,
    /// Bearer token verifier
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Event bus and emitter
    pub realtime: Arc<RealtimeEngine>,
    /// Notice, comment and notification services
    pub services: Services,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Assembles the state from its parts.
    pub fn new(
        config: AppConfig,
        db_pool: Option<DatabasePool>,
        realtime: Arc<RealtimeEngine>,
        services: Services,
    ) -> Self {
        let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));
        Self {
            config: Arc::new(config),
            db_pool,
            jwt_decoder,
            realtime,
            services,
            started_at: Instant::now(),
        }
    }
}
