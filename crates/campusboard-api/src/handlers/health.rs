//! Health check handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

/// GET /api/health/detailed
pub async fn health_detailed(
    State(state): State<AppState>,
) -> Json<ApiResponse<DetailedHealthResponse>> {
    let database = match &state.db_pool {
        None => "memory".to_string(),
        Some(pool) => match pool.health_check().await {
            Ok(true) => "connected".to_string(),
            Ok(false) | Err(_) => "unavailable".to_string(),
        },
    };
    let status = if database == "unavailable" {
        "degraded"
    } else {
        "ok"
    };

    let connections = &state.realtime.connections;
    Json(ApiResponse::ok(DetailedHealthResponse {
        status: status.to_string(),
        database,
        connections: connections.connection_count(),
        online_users: connections.user_count(),
        rooms: connections.room_count(),
    }))
}
