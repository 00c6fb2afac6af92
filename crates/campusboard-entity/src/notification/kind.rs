//! Notification kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What triggered a notification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    /// A notice was posted.
    NewNotice,
    /// Someone commented on the recipient's notice.
    NewComment,
    /// Someone replied to the recipient's comment.
    CommentReply,
    /// System message.
    System,
}

impl NotificationKind {
    /// Return the kind as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewNotice => "new-notice",
            Self::NewComment => "new-comment",
            Self::CommentReply => "comment-reply",
            Self::System => "system",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = campusboard_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new-notice" => Ok(Self::NewNotice),
            "new-comment" => Ok(Self::NewComment),
            "comment-reply" => Ok(Self::CommentReply),
            "system" => Ok(Self::System),
            _ => Err(campusboard_core::AppError::validation(format!(
                "Invalid notification kind: '{s}'"
            ))),
        }
    }
}
