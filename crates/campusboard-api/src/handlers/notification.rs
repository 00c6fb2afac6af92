//! Notification handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use campusboard_core::types::id::NotificationId;

use crate::dto::response::{
    ApiResponse, CountResponse, MessageResponse, NotificationListResponse,
};
use crate::error::ApiError;
use crate::extractors::{AuthUser, LimitQuery};
use crate::state::AppState;

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<LimitQuery>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let listing = state
        .services
        .notifications
        .list(&auth, params.limit)
        .await?;
    Ok(Json(NotificationListResponse {
        success: true,
        data: listing.items,
        unread_count: listing.unread_count,
    }))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state.services.notifications.unread_count(&auth).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}

/// PUT /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.services.notifications.mark_read(&auth, id).await?;
    Ok(Json(MessageResponse::ok("Marked as read")))
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let count = state.services.notifications.mark_all_read(&auth).await?;
    Ok(Json(MessageResponse::ok(format!(
        "Marked {count} notifications as read"
    ))))
}

/// DELETE /api/notifications/{id}
pub async fn delete_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.services.notifications.delete(&auth, id).await?;
    Ok(Json(MessageResponse::ok("Notification deleted")))
}
