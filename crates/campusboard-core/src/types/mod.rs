//! Shared value types.

pub mod id;

pub use id::{CommentId, CorrelationId, NoticeId, NotificationId, UserId};
