//! Store traits for the durable collaborator.
//!
//! The core never looks inside the store: it hands over and receives
//! entities keyed by opaque ids.

use std::sync::Arc;

use async_trait::async_trait;

use campusboard_core::result::AppResult;
use campusboard_core::types::id::{CommentId, NoticeId, NotificationId, UserId};
use campusboard_entity::{Comment, Notice, Notification};

/// Persistence for notices.
#[async_trait]
pub trait NoticeStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new notice.
    async fn insert(&self, notice: &Notice) -> AppResult<()>;

    /// Replace an existing notice. Returns `false` if it does not exist.
    async fn update(&self, notice: &Notice) -> AppResult<bool>;

    /// Delete a notice. Returns `true` if deleted.
    async fn delete(&self, id: NoticeId) -> AppResult<bool>;

    /// Find a notice by id.
    async fn find(&self, id: NoticeId) -> AppResult<Option<Notice>>;

    /// Newest notices first, optionally filtered by department.
    async fn list(&self, department: Option<&str>, limit: u64) -> AppResult<Vec<Notice>>;
}

/// Persistence for comments and their one level of replies.
#[async_trait]
pub trait CommentStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a comment or reply. Any `replies` on the value are ignored.
    async fn insert(&self, comment: &Comment) -> AppResult<()>;

    /// Replace the content of an existing comment. Returns `false` if absent.
    async fn update(&self, comment: &Comment) -> AppResult<bool>;

    /// Delete a comment together with its replies. Returns `true` if deleted.
    async fn delete(&self, id: CommentId) -> AppResult<bool>;

    /// Delete every comment on a notice. Returns the number removed.
    async fn delete_for_notice(&self, notice_id: NoticeId) -> AppResult<u64>;

    /// Find a single comment without its replies.
    async fn find(&self, id: CommentId) -> AppResult<Option<Comment>>;

    /// Top-level comments of a notice, newest first, with replies nested
    /// newest first.
    async fn list_for_notice(&self, notice_id: NoticeId) -> AppResult<Vec<Comment>>;
}

/// Persistence for per-recipient notification records.
#[async_trait]
pub trait NotificationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new record.
    async fn insert(&self, notification: &Notification) -> AppResult<()>;

    /// The recipient's records, newest first.
    async fn list_for_user(&self, user_id: UserId, limit: u64) -> AppResult<Vec<Notification>>;

    /// Number of unread records for the recipient.
    async fn count_unread(&self, user_id: UserId) -> AppResult<u64>;

    /// Mark one of the recipient's records read. Returns `false` if the
    /// record does not exist or belongs to someone else.
    async fn mark_read(&self, id: NotificationId, user_id: UserId) -> AppResult<bool>;

    /// Mark all of the recipient's records read. Returns how many changed.
    async fn mark_all_read(&self, user_id: UserId) -> AppResult<u64>;

    /// Delete one of the recipient's records. Returns `true` if deleted.
    async fn delete(&self, id: NotificationId, user_id: UserId) -> AppResult<bool>;
}

/// The set of stores a running server works against.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Notice persistence.
    pub notices: Arc<dyn NoticeStore>,
    /// Comment persistence.
    pub comments: Arc<dyn CommentStore>,
    /// Notification persistence.
    pub notifications: Arc<dyn NotificationStore>,
}

impl Stores {
    /// Process-local stores. Data lives as long as the value.
    pub fn memory() -> Self {
        Self {
            notices: Arc::new(crate::memory::MemoryNoticeStore::new()),
            comments: Arc::new(crate::memory::MemoryCommentStore::new()),
            notifications: Arc::new(crate::memory::MemoryNotificationStore::new()),
        }
    }

    /// Stores backed by a PostgreSQL pool.
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            notices: Arc::new(crate::postgres::PgNoticeStore::new(pool.clone())),
            comments: Arc::new(crate::postgres::PgCommentStore::new(pool.clone())),
            notifications: Arc::new(crate::postgres::PgNotificationStore::new(pool)),
        }
    }
}

/// Arrange a flat list of comments into top-level threads.
///
/// Threads and replies are ordered newest first. Replies whose parent is
/// not in the list are dropped.
pub fn nest_replies(flat: Vec<Comment>) -> Vec<Comment> {
    let (mut top, replies): (Vec<Comment>, Vec<Comment>) =
        flat.into_iter().partition(|c| c.parent_comment_id.is_none());

    top.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
    for comment in &mut top {
        comment.replies.clear();
    }

    for reply in replies {
        if let Some(parent) = top
            .iter_mut()
            .find(|c| Some(c.id) == reply.parent_comment_id)
        {
            parent.replies.push(reply);
        }
    }

    for comment in &mut top {
        comment
            .replies
            .sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
    }
    top
}
