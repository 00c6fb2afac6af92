//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use campusboard_core::types::id::{CommentId, NoticeId};
use campusboard_entity::NoticePriority;
use campusboard_service::{CommentDraft, NoticeChanges, NoticeDraft};

/// `POST /api/notices`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoticeRequest {
    /// Headline.
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    /// Body.
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    /// Category.
    #[validate(length(min = 1, max = 50, message = "Category must be 1 to 50 characters"))]
    pub category: String,
    /// Target department.
    #[serde(default)]
    pub department: Option<String>,
    /// Display priority.
    #[serde(default)]
    pub priority: Option<NoticePriority>,
}

impl From<CreateNoticeRequest> for NoticeDraft {
    fn from(req: CreateNoticeRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            category: req.category,
            department: req.department,
            priority: req.priority,
        }
    }
}

/// `PUT /api/notices/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoticeRequest {
    /// New headline.
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,
    /// New body.
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: Option<String>,
    /// New category.
    #[validate(length(min = 1, max = 50, message = "Category must be 1 to 50 characters"))]
    pub category: Option<String>,
    /// New department.
    pub department: Option<String>,
    /// New priority.
    pub priority: Option<NoticePriority>,
}

impl From<UpdateNoticeRequest> for NoticeChanges {
    fn from(req: UpdateNoticeRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            category: req.category,
            department: req.department,
            priority: req.priority,
        }
    }
}

/// `POST /api/comments`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    /// The notice being commented on.
    pub notice_id: NoticeId,
    /// Comment text.
    #[validate(length(min = 1, max = 2000, message = "Comment must be 1 to 2000 characters"))]
    pub content: String,
    /// Set for replies.
    #[serde(default)]
    pub parent_comment_id: Option<CommentId>,
}

impl From<CreateCommentRequest> for CommentDraft {
    fn from(req: CreateCommentRequest) -> Self {
        Self {
            notice_id: req.notice_id,
            content: req.content,
            parent_comment_id: req.parent_comment_id,
        }
    }
}

/// `PUT /api/comments/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    /// New text.
    #[validate(length(min = 1, max = 2000, message = "Comment must be 1 to 2000 characters"))]
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_notice_validation() {
        let req: CreateNoticeRequest = serde_json::from_value(serde_json::json!({
            "title": "",
            "content": "body",
            "category": "exam"
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn test_comment_request_reads_camel_case() {
        let notice_id = NoticeId::new();
        let req: CreateCommentRequest = serde_json::from_value(serde_json::json!({
            "noticeId": notice_id,
            "content": "hi"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        let draft = CommentDraft::from(req);
        assert_eq!(draft.notice_id, notice_id);
        assert!(draft.parent_comment_id.is_none());
    }
}
