//! Route definitions for the Campus Board HTTP API.
//!
//! REST routes are mounted under `/api`; the live connection upgrades at
//! `/ws`.

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::handlers;
use crate::state::AppState;

/// Build the router with all routes, without outer layers.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(notification_routes())
        .merge(notice_routes())
        .merge(comment_routes())
        .merge(health_routes());

    let ws_routes = Router::new().route("/ws", get(handlers::ws::ws_upgrade));

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .with_state(state)
}

/// Per-user notification records
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            get(handlers::notification::list_notifications),
        )
        .route(
            "/notifications/unread-count",
            get(handlers::notification::unread_count),
        )
        .route(
            "/notifications/read-all",
            put(handlers::notification::mark_all_read),
        )
        .route(
            "/notifications/{id}/read",
            put(handlers::notification::mark_read),
        )
        .route(
            "/notifications/{id}",
            axum::routing::delete(handlers::notification::delete_notification),
        )
}

/// Public feed and notice CRUD
fn notice_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notices",
            get(handlers::notice::list_notices).post(handlers::notice::create_notice),
        )
        .route(
            "/notices/{id}",
            get(handlers::notice::get_notice)
                .put(handlers::notice::update_notice)
                .delete(handlers::notice::delete_notice),
        )
}

/// Comments and replies
fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/comments", post(handlers::comment::create_comment))
        .route(
            "/comments/notice/{notice_id}",
            get(handlers::comment::list_for_notice),
        )
        .route(
            "/comments/{id}",
            put(handlers::comment::update_comment).delete(handlers::comment::delete_comment),
        )
}

/// Liveness and bus statistics
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}
