//! Notification entity model.

use campusboard_core::types::id::{CommentId, NoticeId, NotificationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::kind::NotificationKind;

/// A durable per-recipient notification record.
///
/// `notice_id` and `comment_id` may dangle after the referenced content is
/// deleted; the record still renders from its own `title` and `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// The recipient user.
    pub recipient_id: UserId,
    /// The user whose action triggered this notification.
    #[serde(default)]
    pub actor_id: Option<UserId>,
    /// What triggered it.
    pub kind: NotificationKind,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// The notice involved.
    #[serde(default)]
    pub notice_id: Option<NoticeId>,
    /// The comment involved.
    #[serde(default)]
    pub comment_id: Option<CommentId>,
    /// Read flag. Only ever moves from `false` to `true`.
    #[serde(default)]
    pub is_read: bool,
    /// When it was read.
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
    /// When it was created.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Build an unread record for a recipient.
    pub fn new(
        recipient_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            recipient_id,
            actor_id: None,
            kind,
            title: title.into(),
            message: message.into(),
            notice_id: None,
            comment_id: None,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    /// Attach the acting user.
    pub fn with_actor(mut self, actor_id: UserId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    /// Attach the notice and optional comment the record refers to.
    pub fn with_reference(mut self, notice_id: NoticeId, comment_id: Option<CommentId>) -> Self {
        self.notice_id = Some(notice_id);
        self.comment_id = comment_id;
        self
    }

    /// Check if the notification has been read.
    pub fn is_unread(&self) -> bool {
        !self.is_read
    }

    /// Mark as read. Returns `true` if the flag changed.
    pub fn mark_read(&mut self) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        self.read_at = Some(Utc::now());
        true
    }
}
