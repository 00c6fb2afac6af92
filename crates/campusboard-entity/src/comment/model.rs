//! Comment entity model.

use campusboard_core::types::id::{CommentId, NoticeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::Author;

/// A comment on a notice, or a reply to a top-level comment.
///
/// Replies nest one level deep: a reply carries `parent_comment_id` and
/// never has replies of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Unique comment identifier.
    pub id: CommentId,
    /// The notice this comment belongs to.
    pub notice_id: NoticeId,
    /// The top-level comment this replies to.
    #[serde(default)]
    pub parent_comment_id: Option<CommentId>,
    /// Comment text.
    pub content: String,
    /// Who wrote it.
    pub author: Author,
    /// Whether the content was edited after posting.
    #[serde(default)]
    pub is_edited: bool,
    /// Nested replies, newest first. Empty for replies.
    #[serde(default)]
    pub replies: Vec<Comment>,
    /// When the comment was posted.
    pub created_at: DateTime<Utc>,
    /// When the comment was last edited.
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Whether this comment is a reply.
    pub fn is_reply(&self) -> bool {
        self.parent_comment_id.is_some()
    }

    /// Number of comments including nested replies.
    pub fn thread_len(&self) -> usize {
        1 + self.replies.len()
    }
}
