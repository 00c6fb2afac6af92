//! Live event types exchanged over the connection.
//!
//! Every frame is a JSON object `{"event": "<name>", "data": <payload>}`.
//! Event names and payload shapes are a compatibility contract with
//! existing clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use campusboard_core::types::id::{CommentId, CorrelationId, NoticeId, NotificationId, UserId};
use campusboard_entity::{Comment, Notice};

/// Events sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// A notice was posted. Broadcast.
    NewNotice {
        /// The notice.
        notice: Notice,
        /// Human-readable summary.
        message: String,
    },
    /// A comment was posted. Broadcast without payload as a refresh
    /// trigger, and targeted with the full payload at affected users.
    NewComment(Option<NewCommentPayload>),
    /// Something about notices changed. Carries the id on deletion.
    NoticeUpdate(Option<NoticeRef>),
    /// Notification state may have changed for someone.
    NotificationUpdate,
    /// A comment was edited. Payload is the edited comment.
    CommentEdited(Comment),
    /// A comment was deleted.
    CommentDeleted {
        /// Deleted comment id.
        id: CommentId,
        /// Notice it belonged to.
        notice_id: NoticeId,
    },
    /// Relayed client-side comment change for one notice room.
    CommentUpdate(CommentUpdate),
    /// Server heartbeat.
    Ping {
        /// Server time when sent.
        timestamp: DateTime<Utc>,
    },
    /// Rejection of a client frame.
    Error {
        /// Machine-readable code.
        code: String,
        /// Description.
        message: String,
    },
}

/// Full payload of a targeted `new-comment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommentPayload {
    /// The new comment.
    pub comment: Comment,
    /// The notice it was posted on.
    pub notice: Notice,
    /// Text for the recipient's notification.
    pub message: String,
    /// The persisted record, when persistence succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<NotificationId>,
}

/// Reference to a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeRef {
    /// The notice id.
    pub notice_id: NoticeId,
}

/// A comment change for viewers of one notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum CommentUpdate {
    /// A comment or reply appeared.
    Add {
        /// The notice.
        notice_id: NoticeId,
        /// The new comment.
        comment: Comment,
        /// Client correlation id of the optimistic write, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correlation_id: Option<CorrelationId>,
    },
    /// A comment's content changed.
    Edit {
        /// The notice.
        notice_id: NoticeId,
        /// The comment.
        comment_id: CommentId,
        /// New content.
        content: String,
    },
    /// A comment was removed.
    Delete {
        /// The notice.
        notice_id: NoticeId,
        /// The comment.
        comment_id: CommentId,
    },
}

impl CommentUpdate {
    /// The notice this update belongs to.
    pub fn notice_id(&self) -> NoticeId {
        match self {
            Self::Add { notice_id, .. }
            | Self::Edit { notice_id, .. }
            | Self::Delete { notice_id, .. } => *notice_id,
        }
    }
}

/// Events sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Join the caller's personal room.
    JoinRoom(UserId),
    /// Leave the caller's personal room.
    LeaveRoom(UserId),
    /// Start viewing a notice.
    JoinNotice(NoticeId),
    /// Stop viewing a notice.
    LeaveNotice(NoticeId),
    /// A comment was posted from this client.
    CommentAdded {
        /// The notice.
        notice_id: NoticeId,
        /// The comment as returned by the REST call.
        comment: Comment,
        /// Correlation id of the optimistic write.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correlation_id: Option<CorrelationId>,
    },
    /// A comment was edited from this client.
    CommentEdited {
        /// The notice.
        notice_id: NoticeId,
        /// The comment.
        comment_id: CommentId,
        /// New content.
        content: String,
    },
    /// A comment was deleted from this client.
    CommentDeleted {
        /// The notice.
        notice_id: NoticeId,
        /// The comment.
        comment_id: CommentId,
    },
    /// Heartbeat reply.
    Pong,
}

impl ServerEvent {
    /// The wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewNotice { .. } => "new-notice",
            Self::NewComment(_) => "new-comment",
            Self::NoticeUpdate(_) => "notice-update",
            Self::NotificationUpdate => "notification-update",
            Self::CommentEdited(_) => "comment-edited",
            Self::CommentDeleted { .. } => "comment-deleted",
            Self::CommentUpdate(_) => "comment-update",
            Self::Ping { .. } => "ping",
            Self::Error { .. } => "error",
        }
    }

    /// Builds an error event.
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unit_and_empty_events() {
        let json = serde_json::to_value(ServerEvent::NotificationUpdate).unwrap();
        assert_eq!(json, json!({"event": "notification-update"}));

        let json = serde_json::to_value(ServerEvent::NewComment(None)).unwrap();
        assert_eq!(json["event"], "new-comment");
        assert!(json["data"].is_null());

        let json = serde_json::to_value(ServerEvent::NoticeUpdate(None)).unwrap();
        assert_eq!(json["event"], "notice-update");
    }

    #[test]
    fn test_comment_deleted_shape() {
        let id = CommentId::new();
        let notice_id = NoticeId::new();
        let json = serde_json::to_value(ServerEvent::CommentDeleted { id, notice_id }).unwrap();
        assert_eq!(
            json,
            json!({"event": "comment-deleted", "data": {"id": id, "noticeId": notice_id}})
        );
    }

    #[test]
    fn test_comment_update_is_typed() {
        let notice_id = NoticeId::new();
        let comment_id = CommentId::new();
        let event = ServerEvent::CommentUpdate(CommentUpdate::Edit {
            notice_id,
            comment_id,
            content: "fixed typo".into(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "comment-update");
        assert_eq!(json["data"]["type"], "edit");
        assert_eq!(json["data"]["commentId"], json!(comment_id));
        assert_eq!(json["data"]["content"], "fixed typo");

        let back: ServerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_parse_client_events() {
        let user = UserId::new();
        let raw = format!(r#"{{"event":"join-room","data":"{user}"}}"#);
        assert_eq!(
            serde_json::from_str::<ClientEvent>(&raw).unwrap(),
            ClientEvent::JoinRoom(user)
        );

        let notice = NoticeId::new();
        let comment = CommentId::new();
        let raw = format!(
            r#"{{"event":"comment-deleted","data":{{"noticeId":"{notice}","commentId":"{comment}"}}}}"#
        );
        assert_eq!(
            serde_json::from_str::<ClientEvent>(&raw).unwrap(),
            ClientEvent::CommentDeleted {
                notice_id: notice,
                comment_id: comment
            }
        );

        assert_eq!(
            serde_json::from_str::<ClientEvent>(r#"{"event":"pong"}"#).unwrap(),
            ClientEvent::Pong
        );
        assert!(serde_json::from_str::<ClientEvent>(r#"{"event":"subscribe"}"#).is_err());
    }
}
