//! Notification writer: persists one record per recipient of a write.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error};

use campusboard_core::types::id::NotificationId;
use campusboard_database::NotificationStore;
use campusboard_entity::{DomainEvent, Notification};
use campusboard_realtime::PushTarget;

use super::rules::comment_recipients;

/// Records built for one write and which of them reached the store.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyOutcome {
    /// Every record built, persisted or not.
    pub records: Vec<Notification>,
    /// Ids of the records the store accepted.
    pub persisted: Vec<NotificationId>,
    /// Number of records the store rejected.
    pub failures: usize,
}

impl NotifyOutcome {
    /// Whether a record made it into the store.
    pub fn is_persisted(&self, id: NotificationId) -> bool {
        self.persisted.contains(&id)
    }

    /// Push targets for the emitter. Records that failed to persist are
    /// still pushed from memory, without an id.
    pub fn push_targets(&self) -> Vec<PushTarget> {
        self.records
            .iter()
            .map(|record| PushTarget {
                recipient: record.recipient_id,
                message: record.message.clone(),
                notification_id: self.is_persisted(record.id).then_some(record.id),
            })
            .collect()
    }
}

/// Builds and persists notification records for committed writes.
#[derive(Debug, Clone)]
pub struct NotificationWriter {
    store: Arc<dyn NotificationStore>,
}

impl NotificationWriter {
    /// Creates a writer over a notification store.
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// Persists one record per recipient of the write.
    ///
    /// Never fails: each insert runs independently and a rejected insert
    /// is logged and counted without affecting the others.
    pub async fn record_and_notify(&self, event: &DomainEvent) -> NotifyOutcome {
        let records = match event {
            DomainEvent::CommentCreated {
                comment,
                notice,
                parent,
            } => comment_recipients(comment, notice, parent.as_ref())
                .into_iter()
                .map(|r| {
                    Notification::new(r.user_id, r.kind, r.title, r.message)
                        .with_actor(comment.author.id)
                        .with_reference(notice.id, Some(comment.id))
                })
                .collect::<Vec<_>>(),
            _ => Vec::new(),
        };

        if records.is_empty() {
            return NotifyOutcome::default();
        }

        let results = join_all(records.iter().map(|record| self.store.insert(record))).await;

        let mut outcome = NotifyOutcome {
            records: Vec::with_capacity(results.len()),
            ..NotifyOutcome::default()
        };
        for (record, result) in records.into_iter().zip(results) {
            match result {
                Ok(()) => outcome.persisted.push(record.id),
                Err(e) => {
                    error!(
                        recipient = %record.recipient_id,
                        kind = %record.kind,
                        error = %e,
                        "Failed to persist notification"
                    );
                    outcome.failures += 1;
                }
            }
            outcome.records.push(record);
        }

        debug!(
            event = event.name(),
            persisted = outcome.persisted.len(),
            failures = outcome.failures,
            "Recorded notifications"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use campusboard_core::error::AppError;
    use campusboard_core::result::AppResult;
    use campusboard_core::types::id::{CommentId, NoticeId, UserId};
    use campusboard_database::memory::MemoryNotificationStore;
    use campusboard_entity::{Author, Comment, Notice, NoticePriority, NotificationKind, UserRole};
    use chrono::Utc;

    /// Rejects inserts for one recipient and stores the rest.
    #[derive(Debug)]
    struct FlakyStore {
        inner: MemoryNotificationStore,
        reject: UserId,
    }

    #[async_trait]
    impl NotificationStore for FlakyStore {
        async fn insert(&self, n: &Notification) -> AppResult<()> {
            if n.recipient_id == self.reject {
                return Err(AppError::database("connection reset"));
            }
            self.inner.insert(n).await
        }
        async fn list_for_user(&self, u: UserId, l: u64) -> AppResult<Vec<Notification>> {
            self.inner.list_for_user(u, l).await
        }
        async fn count_unread(&self, u: UserId) -> AppResult<u64> {
            self.inner.count_unread(u).await
        }
        async fn mark_read(&self, id: NotificationId, u: UserId) -> AppResult<bool> {
            self.inner.mark_read(id, u).await
        }
        async fn mark_all_read(&self, u: UserId) -> AppResult<u64> {
            self.inner.mark_all_read(u).await
        }
        async fn delete(&self, id: NotificationId, u: UserId) -> AppResult<bool> {
            self.inner.delete(id, u).await
        }
    }

    fn author(name: &str) -> Author {
        Author {
            id: UserId::new(),
            name: name.into(),
            role: UserRole::Faculty,
            department: None,
        }
    }

    fn notice(owner: &Author) -> Notice {
        let now = Utc::now();
        Notice {
            id: NoticeId::new(),
            title: "notice 7".into(),
            content: "c".into(),
            category: "general".into(),
            department: "Civil".into(),
            priority: NoticePriority::Medium,
            author: owner.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn comment(by: &Author, notice: &Notice, parent: Option<CommentId>) -> Comment {
        let now = Utc::now();
        Comment {
            id: CommentId::new(),
            notice_id: notice.id,
            parent_comment_id: parent,
            content: "hi".into(),
            author: by.clone(),
            is_edited: false,
            replies: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_records_owner_notification() {
        let store = Arc::new(MemoryNotificationStore::new());
        let writer = NotificationWriter::new(store.clone());
        let a = author("A");
        let b = author("B");
        let n = notice(&a);
        let c = comment(&b, &n, None);

        let outcome = writer
            .record_and_notify(&DomainEvent::CommentCreated {
                comment: c.clone(),
                notice: n.clone(),
                parent: None,
            })
            .await;

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.failures, 0);
        let stored = store.list_for_user(a.id, 10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].kind, NotificationKind::NewComment);
        assert_eq!(stored[0].actor_id, Some(b.id));
        assert_eq!(stored[0].comment_id, Some(c.id));
        assert_eq!(
            outcome.push_targets()[0].notification_id,
            Some(stored[0].id)
        );
    }

    #[tokio::test]
    async fn test_self_comment_records_nothing() {
        let store = Arc::new(MemoryNotificationStore::new());
        let writer = NotificationWriter::new(store.clone());
        let a = author("A");
        let n = notice(&a);

        let outcome = writer
            .record_and_notify(&DomainEvent::CommentCreated {
                comment: comment(&a, &n, None),
                notice: n,
                parent: None,
            })
            .await;

        assert!(outcome.records.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_others() {
        let owner = author("Owner");
        let student = author("Sam");
        let replier = author("Prof");
        let store = Arc::new(FlakyStore {
            inner: MemoryNotificationStore::new(),
            reject: owner.id,
        });
        let writer = NotificationWriter::new(store.clone());
        let n = notice(&owner);
        let parent = comment(&student, &n, None);
        let reply = comment(&replier, &n, Some(parent.id));

        let outcome = writer
            .record_and_notify(&DomainEvent::CommentCreated {
                comment: reply,
                notice: n,
                parent: Some(parent),
            })
            .await;

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.failures, 1);
        assert_eq!(outcome.persisted.len(), 1);
        assert_eq!(store.inner.count_unread(student.id).await.unwrap(), 1);

        let targets = outcome.push_targets();
        let owner_target = targets.iter().find(|t| t.recipient == owner.id).unwrap();
        assert_eq!(owner_target.notification_id, None);
    }

    #[tokio::test]
    async fn test_other_events_record_nothing() {
        let writer = NotificationWriter::new(Arc::new(MemoryNotificationStore::new()));
        let outcome = writer
            .record_and_notify(&DomainEvent::NoticeDeleted(NoticeId::new()))
            .await;
        assert!(outcome.records.is_empty());
    }
}
