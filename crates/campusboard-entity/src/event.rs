//! Completed domain writes, as handed to the notification writer and the
//! event emitter.

use campusboard_core::types::id::{CommentId, NoticeId};

use crate::comment::Comment;
use crate::notice::Notice;

/// A domain mutation that has been committed to the store.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A notice was created.
    NoticeCreated(Notice),
    /// A notice was edited.
    NoticeUpdated(Notice),
    /// A notice was deleted.
    NoticeDeleted(NoticeId),
    /// A comment or reply was created.
    CommentCreated {
        /// The new comment.
        comment: Comment,
        /// The notice it was posted on.
        notice: Notice,
        /// The comment it replies to, for replies.
        parent: Option<Comment>,
    },
    /// A comment was edited.
    CommentEdited(Comment),
    /// A comment was deleted.
    CommentDeleted {
        /// The deleted comment.
        id: CommentId,
        /// The notice it belonged to.
        notice_id: NoticeId,
    },
}

impl DomainEvent {
    /// Short name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoticeCreated(_) => "notice.created",
            Self::NoticeUpdated(_) => "notice.updated",
            Self::NoticeDeleted(_) => "notice.deleted",
            Self::CommentCreated { .. } => "comment.created",
            Self::CommentEdited(_) => "comment.edited",
            Self::CommentDeleted { .. } => "comment.deleted",
        }
    }
}
