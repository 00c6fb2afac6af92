//! Notice handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use validator::Validate;

use campusboard_core::types::id::NoticeId;
use campusboard_entity::Notice;

use crate::dto::request::{CreateNoticeRequest, UpdateNoticeRequest};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{AuthUser, FeedQuery};
use crate::state::AppState;

/// GET /api/notices
pub async fn list_notices(
    State(state): State<AppState>,
    Query(params): Query<FeedQuery>,
) -> Result<Json<ApiResponse<Vec<Notice>>>, ApiError> {
    let notices = state
        .services
        .notices
        .list(params.department.as_deref(), params.limit)
        .await?;
    Ok(Json(ApiResponse::ok(notices)))
}

/// GET /api/notices/{id}
pub async fn get_notice(
    State(state): State<AppState>,
    Path(id): Path<NoticeId>,
) -> Result<Json<ApiResponse<Notice>>, ApiError> {
    let notice = state.services.notices.get(id).await?;
    Ok(Json(ApiResponse::ok(notice)))
}

/// POST /api/notices
pub async fn create_notice(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateNoticeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Notice>>), ApiError> {
    req.validate()?;
    let outcome = state.services.notices.create(&auth, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(outcome.entity))))
}

/// PUT /api/notices/{id}
pub async fn update_notice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<NoticeId>,
    Json(req): Json<UpdateNoticeRequest>,
) -> Result<Json<ApiResponse<Notice>>, ApiError> {
    req.validate()?;
    let outcome = state.services.notices.update(&auth, id, req.into()).await?;
    Ok(Json(ApiResponse::ok(outcome.entity)))
}

/// DELETE /api/notices/{id}
pub async fn delete_notice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<NoticeId>,
) -> Result<Json<ApiResponse<Notice>>, ApiError> {
    let outcome = state.services.notices.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(outcome.entity)))
}
