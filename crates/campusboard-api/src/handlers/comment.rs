//! Comment handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::warn;
use validator::Validate;

use campusboard_core::types::id::{CommentId, NoticeId};
use campusboard_entity::Comment;

use crate::dto::request::{CreateCommentRequest, UpdateCommentRequest};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/comments/notice/{notice_id}
pub async fn list_for_notice(
    State(state): State<AppState>,
    Path(notice_id): Path<NoticeId>,
) -> Result<Json<ApiResponse<Vec<Comment>>>, ApiError> {
    let comments = state.services.comments.list_for_notice(notice_id).await?;
    Ok(Json(ApiResponse::ok(comments)))
}

/// POST /api/comments
pub async fn create_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Comment>>), ApiError> {
    req.validate()?;
    let outcome = state.services.comments.create(&auth, req.into()).await?;
    if outcome.notifications.failures > 0 {
        warn!(
            comment_id = %outcome.entity.id,
            failures = outcome.notifications.failures,
            "Comment saved but some notifications were not persisted"
        );
    }
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(outcome.entity))))
}

/// PUT /api/comments/{id}
pub async fn update_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<CommentId>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<Json<ApiResponse<Comment>>, ApiError> {
    req.validate()?;
    let outcome = state
        .services
        .comments
        .edit(&auth, id, req.content)
        .await?;
    Ok(Json(ApiResponse::ok(outcome.entity)))
}

/// DELETE /api/comments/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<CommentId>,
) -> Result<Json<ApiResponse<Comment>>, ApiError> {
    let outcome = state.services.comments.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(outcome.entity)))
}
