//! Event emitter: turns committed domain writes into push events.
//!
//! | write | broadcast | targeted |
//! |---|---|---|
//! | notice created | `notice-update`, `new-notice` | |
//! | notice updated | `notice-update` | |
//! | notice deleted | `notice-update` with id | |
//! | comment created | `notification-update`, `new-comment` (empty) | `new-comment` per recipient room |
//! | comment edited | `notification-update`, `comment-edited` | |
//! | comment deleted | `notification-update`, `comment-deleted` | |

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use campusboard_core::types::id::{NotificationId, UserId};
use campusboard_entity::DomainEvent;

use crate::connection::manager::ConnectionManager;
use crate::message::types::{NewCommentPayload, NoticeRef, ServerEvent};
use crate::room::RoomKey;

/// One user to receive a targeted push for a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushTarget {
    /// The recipient; their personal room is targeted.
    pub recipient: UserId,
    /// Text shown to the recipient.
    pub message: String,
    /// The persisted record, when persistence succeeded.
    pub notification_id: Option<NotificationId>,
}

/// How many connections accepted the pushes of one write.
///
/// Independent of whether notification records were persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    /// Frames accepted from broadcasts.
    pub broadcast: usize,
    /// Frames accepted from targeted sends.
    pub targeted: usize,
}

/// Emits the push events for completed writes.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    connections: Arc<ConnectionManager>,
}

impl EventEmitter {
    /// Creates an emitter over the shared connection manager.
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    /// Pushes the events for one committed write.
    ///
    /// `targets` only matters for comment creation. A target equal to the
    /// comment author is skipped.
    pub fn emit(&self, event: &DomainEvent, targets: &[PushTarget]) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        match event {
            DomainEvent::NoticeCreated(notice) => {
                report.broadcast += self.connections.broadcast(&ServerEvent::NoticeUpdate(None));
                report.broadcast += self.connections.broadcast(&ServerEvent::NewNotice {
                    notice: notice.clone(),
                    message: format!("New {} notice posted", notice.category),
                });
            }
            DomainEvent::NoticeUpdated(_) => {
                report.broadcast += self.connections.broadcast(&ServerEvent::NoticeUpdate(None));
            }
            DomainEvent::NoticeDeleted(notice_id) => {
                report.broadcast +=
                    self.connections
                        .broadcast(&ServerEvent::NoticeUpdate(Some(NoticeRef {
                            notice_id: *notice_id,
                        })));
            }
            DomainEvent::CommentCreated {
                comment, notice, ..
            } => {
                report.broadcast += self
                    .connections
                    .broadcast(&ServerEvent::NotificationUpdate);

                for target in targets.iter().filter(|t| t.recipient != comment.author.id) {
                    let payload = NewCommentPayload {
                        comment: comment.clone(),
                        notice: notice.clone(),
                        message: target.message.clone(),
                        notification_id: target.notification_id,
                    };
                    report.targeted += self.connections.send_to_room(
                        &RoomKey::User(target.recipient),
                        &ServerEvent::NewComment(Some(payload)),
                    );
                }

                report.broadcast += self.connections.broadcast(&ServerEvent::NewComment(None));
            }
            DomainEvent::CommentEdited(comment) => {
                report.broadcast += self
                    .connections
                    .broadcast(&ServerEvent::NotificationUpdate);
                report.broadcast += self
                    .connections
                    .broadcast(&ServerEvent::CommentEdited(comment.clone()));
            }
            DomainEvent::CommentDeleted { id, notice_id } => {
                report.broadcast += self
                    .connections
                    .broadcast(&ServerEvent::NotificationUpdate);
                report.broadcast += self.connections.broadcast(&ServerEvent::CommentDeleted {
                    id: *id,
                    notice_id: *notice_id,
                });
            }
        }

        debug!(
            event = event.name(),
            broadcast = report.broadcast,
            targeted = report.targeted,
            "Emitted push events"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusboard_core::config::RealtimeConfig;
    use campusboard_core::types::id::{CommentId, NoticeId};
    use campusboard_entity::{Author, Comment, Identity, Notice, NoticePriority, UserRole};
    use chrono::Utc;
    use tokio::sync::mpsc;

    fn identity(name: &str, role: UserRole) -> Identity {
        Identity {
            user_id: UserId::new(),
            name: name.into(),
            role,
            department: None,
        }
    }

    fn notice_by(owner: &Identity) -> Notice {
        let now = Utc::now();
        Notice {
            id: NoticeId::new(),
            title: "notice 7".into(),
            content: "Exam schedule".into(),
            category: "exam".into(),
            department: "Civil".into(),
            priority: NoticePriority::High,
            author: owner.author(),
            created_at: now,
            updated_at: now,
        }
    }

    fn comment_by(author: &Identity, notice: &Notice) -> Comment {
        let now = Utc::now();
        Comment {
            id: CommentId::new(),
            notice_id: notice.id,
            parent_comment_id: None,
            content: "hi".into(),
            author: Author {
                id: author.user_id,
                name: author.name.clone(),
                role: author.role,
                department: None,
            },
            is_edited: false,
            replies: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            events.push(serde_json::from_str(&frame).unwrap());
        }
        events
    }

    fn setup() -> (Arc<ConnectionManager>, EventEmitter) {
        let manager = Arc::new(ConnectionManager::new(RealtimeConfig::default()));
        let emitter = EventEmitter::new(manager.clone());
        (manager, emitter)
    }

    #[tokio::test]
    async fn test_notice_created_broadcasts_two_events() {
        let (manager, emitter) = setup();
        let (_conn, mut rx) = manager.register(None);
        let owner = identity("Dr. Rao", UserRole::Faculty);
        let notice = notice_by(&owner);

        let report = emitter.emit(&DomainEvent::NoticeCreated(notice.clone()), &[]);

        assert_eq!(report, DeliveryReport { broadcast: 2, targeted: 0 });
        let events = drain(&mut rx);
        assert_eq!(events[0], ServerEvent::NoticeUpdate(None));
        assert_eq!(
            events[1],
            ServerEvent::NewNotice {
                notice,
                message: "New exam notice posted".into()
            }
        );
    }

    #[tokio::test]
    async fn test_comment_created_targets_owner_room() {
        let (manager, emitter) = setup();
        let owner = identity("A", UserRole::Faculty);
        let commenter = identity("B", UserRole::Student);
        let (owner_conn, mut owner_rx) = manager.register(Some(owner.clone()));
        manager.join(&owner_conn.id, RoomKey::User(owner.user_id)).unwrap();
        let (_other, mut other_rx) = manager.register(None);

        let notice = notice_by(&owner);
        let comment = comment_by(&commenter, &notice);
        let record_id = NotificationId::new();
        let event = DomainEvent::CommentCreated {
            comment: comment.clone(),
            notice: notice.clone(),
            parent: None,
        };
        let report = emitter.emit(
            &event,
            &[PushTarget {
                recipient: owner.user_id,
                message: "B commented on notice 7".into(),
                notification_id: Some(record_id),
            }],
        );

        assert_eq!(report.targeted, 1);
        assert_eq!(report.broadcast, 4);

        let owner_events = drain(&mut owner_rx);
        assert_eq!(owner_events.len(), 3);
        assert_eq!(owner_events[0], ServerEvent::NotificationUpdate);
        match &owner_events[1] {
            ServerEvent::NewComment(Some(payload)) => {
                assert_eq!(payload.comment, comment);
                assert_eq!(payload.notice.id, notice.id);
                assert_eq!(payload.message, "B commented on notice 7");
                assert_eq!(payload.notification_id, Some(record_id));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(owner_events[2], ServerEvent::NewComment(None));

        assert_eq!(
            drain(&mut other_rx),
            vec![ServerEvent::NotificationUpdate, ServerEvent::NewComment(None)]
        );
    }

    #[tokio::test]
    async fn test_no_targeted_push_to_author() {
        let (manager, emitter) = setup();
        let owner = identity("A", UserRole::Faculty);
        let (conn, mut rx) = manager.register(Some(owner.clone()));
        manager.join(&conn.id, RoomKey::User(owner.user_id)).unwrap();

        let notice = notice_by(&owner);
        let comment = comment_by(&owner, &notice);
        let report = emitter.emit(
            &DomainEvent::CommentCreated {
                comment,
                notice,
                parent: None,
            },
            &[PushTarget {
                recipient: owner.user_id,
                message: "self".into(),
                notification_id: None,
            }],
        );

        assert_eq!(report.targeted, 0);
        assert!(drain(&mut rx)
            .iter()
            .all(|e| !matches!(e, ServerEvent::NewComment(Some(_)))));
    }

    #[tokio::test]
    async fn test_comment_deleted_and_notice_deleted_payloads() {
        let (manager, emitter) = setup();
        let (_conn, mut rx) = manager.register(None);
        let notice_id = NoticeId::new();
        let comment_id = CommentId::new();

        emitter.emit(
            &DomainEvent::CommentDeleted {
                id: comment_id,
                notice_id,
            },
            &[],
        );
        emitter.emit(&DomainEvent::NoticeDeleted(notice_id), &[]);

        assert_eq!(
            drain(&mut rx),
            vec![
                ServerEvent::NotificationUpdate,
                ServerEvent::CommentDeleted {
                    id: comment_id,
                    notice_id
                },
                ServerEvent::NoticeUpdate(Some(NoticeRef { notice_id })),
            ]
        );
    }
}
