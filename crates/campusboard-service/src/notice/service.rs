//! Notice service: create, edit, delete and list notices.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use campusboard_core::config::NotificationsConfig;
use campusboard_core::error::AppError;
use campusboard_core::result::AppResult;
use campusboard_core::types::id::NoticeId;
use campusboard_database::{CommentStore, NoticeStore};
use campusboard_entity::{DomainEvent, Notice, NoticePriority};
use campusboard_entity::notice::ALL_DEPARTMENTS;
use campusboard_realtime::EventEmitter;

use crate::context::RequestContext;
use crate::outcome::WriteOutcome;

/// Fields for a new notice.
#[derive(Debug, Clone)]
pub struct NoticeDraft {
    /// Headline.
    pub title: String,
    /// Body.
    pub content: String,
    /// Category.
    pub category: String,
    /// Target department. Defaults to all departments.
    pub department: Option<String>,
    /// Display priority.
    pub priority: Option<NoticePriority>,
}

/// Partial update of a notice. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct NoticeChanges {
    /// New headline.
    pub title: Option<String>,
    /// New body.
    pub content: Option<String>,
    /// New category.
    pub category: Option<String>,
    /// New department.
    pub department: Option<String>,
    /// New priority.
    pub priority: Option<NoticePriority>,
}

/// Notice CRUD with live fan-out.
#[derive(Debug, Clone)]
pub struct NoticeService {
    notices: Arc<dyn NoticeStore>,
    comments: Arc<dyn CommentStore>,
    emitter: Arc<EventEmitter>,
    config: NotificationsConfig,
}

impl NoticeService {
    /// Creates a new notice service.
    pub fn new(
        notices: Arc<dyn NoticeStore>,
        comments: Arc<dyn CommentStore>,
        emitter: Arc<EventEmitter>,
        config: NotificationsConfig,
    ) -> Self {
        Self {
            notices,
            comments,
            emitter,
            config,
        }
    }

    /// Public feed, newest first.
    pub async fn list(&self, department: Option<&str>, limit: Option<u64>) -> AppResult<Vec<Notice>> {
        let department = department.filter(|d| !d.is_empty() && *d != ALL_DEPARTMENTS);
        self.notices
            .list(department, self.config.clamp_feed_limit(limit))
            .await
    }

    /// Gets a notice by id.
    pub async fn get(&self, id: NoticeId) -> AppResult<Notice> {
        self.notices
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found("Notice not found"))
    }

    /// Publishes a notice. Faculty and admins only.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        draft: NoticeDraft,
    ) -> AppResult<WriteOutcome<Notice>> {
        ctx.require_publisher("post notices")?;
        let title = required(draft.title, "title")?;
        let content = required(draft.content, "content")?;
        let category = required(draft.category, "category")?;

        let now = Utc::now();
        let notice = Notice {
            id: NoticeId::new(),
            title,
            content,
            category,
            department: draft
                .department
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| ALL_DEPARTMENTS.to_string()),
            priority: draft.priority.unwrap_or_default(),
            author: ctx.author(),
            created_at: now,
            updated_at: now,
        };
        self.notices.insert(&notice).await?;

        info!(notice_id = %notice.id, user_id = %ctx.user_id(), "Notice created");

        let delivery = self
            .emitter
            .emit(&DomainEvent::NoticeCreated(notice.clone()), &[]);
        Ok(WriteOutcome::without_notifications(notice, delivery))
    }

    /// Edits a notice. Owner or admin only.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: NoticeId,
        changes: NoticeChanges,
    ) -> AppResult<WriteOutcome<Notice>> {
        let mut notice = self.get(id).await?;
        ctx.require_owner(notice.author.id, "notice")?;

        if let Some(title) = changes.title {
            notice.title = required(title, "title")?;
        }
        if let Some(content) = changes.content {
            notice.content = required(content, "content")?;
        }
        if let Some(category) = changes.category {
            notice.category = required(category, "category")?;
        }
        if let Some(department) = changes.department {
            notice.department = required(department, "department")?;
        }
        if let Some(priority) = changes.priority {
            notice.priority = priority;
        }
        notice.updated_at = Utc::now();

        if !self.notices.update(&notice).await? {
            return Err(AppError::not_found("Notice not found"));
        }

        info!(notice_id = %notice.id, user_id = %ctx.user_id(), "Notice updated");

        let delivery = self
            .emitter
            .emit(&DomainEvent::NoticeUpdated(notice.clone()), &[]);
        Ok(WriteOutcome::without_notifications(notice, delivery))
    }

    /// Deletes a notice and its comments. Owner or admin only.
    ///
    /// Notification records that refer to the notice are kept.
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        id: NoticeId,
    ) -> AppResult<WriteOutcome<Notice>> {
        let notice = self.get(id).await?;
        ctx.require_owner(notice.author.id, "notice")?;

        let removed_comments = self.comments.delete_for_notice(id).await?;
        if !self.notices.delete(id).await? {
            return Err(AppError::not_found("Notice not found"));
        }

        info!(
            notice_id = %id,
            user_id = %ctx.user_id(),
            removed_comments,
            "Notice deleted"
        );

        let delivery = self.emitter.emit(&DomainEvent::NoticeDeleted(id), &[]);
        Ok(WriteOutcome::without_notifications(notice, delivery))
    }
}

fn required(value: String, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
