//! Comment service.
//!
//! Creating a comment runs the full write path: store, then one
//! notification record per recipient, then push events. Persistence of
//! the records and push delivery are reported separately.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use campusboard_core::error::AppError;
use campusboard_core::result::AppResult;
use campusboard_core::types::id::{CommentId, NoticeId};
use campusboard_database::{CommentStore, NoticeStore};
use campusboard_entity::{Comment, DomainEvent, Notice};
use campusboard_realtime::EventEmitter;
use campusboard_realtime::message::validator::validate_comment_content;

use crate::context::RequestContext;
use crate::notification::NotificationWriter;
use crate::outcome::WriteOutcome;

/// Fields for a new comment or reply.
#[derive(Debug, Clone)]
pub struct CommentDraft {
    /// The notice being commented on.
    pub notice_id: NoticeId,
    /// Comment text.
    pub content: String,
    /// Set for replies: the top-level comment being answered.
    pub parent_comment_id: Option<CommentId>,
}

/// Comment CRUD.
#[derive(Debug, Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentStore>,
    notices: Arc<dyn NoticeStore>,
    writer: Arc<NotificationWriter>,
    emitter: Arc<EventEmitter>,
}

impl CommentService {
    /// Creates a new comment service.
    pub fn new(
        comments: Arc<dyn CommentStore>,
        notices: Arc<dyn NoticeStore>,
        writer: Arc<NotificationWriter>,
        emitter: Arc<EventEmitter>,
    ) -> Self {
        Self {
            comments,
            notices,
            writer,
            emitter,
        }
    }

    /// Threads of a notice, newest first.
    pub async fn list_for_notice(&self, notice_id: NoticeId) -> AppResult<Vec<Comment>> {
        self.notice(notice_id).await?;
        self.comments.list_for_notice(notice_id).await
    }

    /// Posts a comment or a reply.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        draft: CommentDraft,
    ) -> AppResult<WriteOutcome<Comment>> {
        validate_comment_content(&draft.content)?;
        let notice = self.notice(draft.notice_id).await?;

        let parent = match draft.parent_comment_id {
            Some(parent_id) => Some(self.reply_parent(ctx, &notice, parent_id).await?),
            None => None,
        };

        let now = Utc::now();
        let comment = Comment {
            id: CommentId::new(),
            notice_id: notice.id,
            parent_comment_id: parent.as_ref().map(|p| p.id),
            content: draft.content.trim().to_string(),
            author: ctx.author(),
            is_edited: false,
            replies: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.comments.insert(&comment).await?;

        info!(
            comment_id = %comment.id,
            notice_id = %notice.id,
            user_id = %ctx.user_id(),
            reply = comment.is_reply(),
            "Comment created"
        );

        let event = DomainEvent::CommentCreated {
            comment: comment.clone(),
            notice,
            parent,
        };
        let notifications = self.writer.record_and_notify(&event).await;
        let delivery = self.emitter.emit(&event, &notifications.push_targets());

        Ok(WriteOutcome {
            entity: comment,
            notifications,
            delivery,
        })
    }

    /// Edits a comment's content. Author or admin only.
    pub async fn edit(
        &self,
        ctx: &RequestContext,
        id: CommentId,
        content: String,
    ) -> AppResult<WriteOutcome<Comment>> {
        validate_comment_content(&content)?;
        let mut comment = self.get(id).await?;
        ctx.require_owner(comment.author.id, "comment")?;

        comment.content = content.trim().to_string();
        comment.is_edited = true;
        comment.updated_at = Utc::now();

        if !self.comments.update(&comment).await? {
            return Err(AppError::not_found("Comment not found"));
        }

        info!(comment_id = %id, user_id = %ctx.user_id(), "Comment edited");

        let delivery = self
            .emitter
            .emit(&DomainEvent::CommentEdited(comment.clone()), &[]);
        Ok(WriteOutcome::without_notifications(comment, delivery))
    }

    /// Deletes a comment and its replies. Author or admin only.
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        id: CommentId,
    ) -> AppResult<WriteOutcome<Comment>> {
        let comment = self.get(id).await?;
        ctx.require_owner(comment.author.id, "comment")?;

        if !self.comments.delete(id).await? {
            return Err(AppError::not_found("Comment not found"));
        }

        info!(comment_id = %id, user_id = %ctx.user_id(), "Comment deleted");

        let delivery = self.emitter.emit(
            &DomainEvent::CommentDeleted {
                id,
                notice_id: comment.notice_id,
            },
            &[],
        );
        Ok(WriteOutcome::without_notifications(comment, delivery))
    }

    async fn get(&self, id: CommentId) -> AppResult<Comment> {
        self.comments
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment not found"))
    }

    async fn notice(&self, id: NoticeId) -> AppResult<Notice> {
        self.notices
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found("Notice not found"))
    }

    async fn reply_parent(
        &self,
        ctx: &RequestContext,
        notice: &Notice,
        parent_id: CommentId,
    ) -> AppResult<Comment> {
        ctx.require_publisher("reply to comments")?;

        let parent = self
            .comments
            .find(parent_id)
            .await?
            .filter(|p| p.notice_id == notice.id)
            .ok_or_else(|| AppError::not_found("Parent comment not found"))?;

        if parent.is_reply() {
            return Err(AppError::validation("Replies can only be one level deep"));
        }
        Ok(parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusboard_core::config::RealtimeConfig;
    use campusboard_core::error::ErrorKind;
    use campusboard_core::types::id::UserId;
    use campusboard_database::Stores;
    use campusboard_entity::{Identity, NotificationKind, UserRole};
    use campusboard_realtime::{RealtimeEngine, RoomKey};

    struct Fixture {
        stores: Stores,
        engine: RealtimeEngine,
        svc: CommentService,
    }

    fn fixture() -> Fixture {
        let stores = Stores::memory();
        let engine = RealtimeEngine::new(RealtimeConfig::default());
        let writer = Arc::new(NotificationWriter::new(stores.notifications.clone()));
        let svc = CommentService::new(
            stores.comments.clone(),
            stores.notices.clone(),
            writer,
            engine.emitter.clone(),
        );
        Fixture { stores, engine, svc }
    }

    fn ctx(name: &str, role: UserRole) -> RequestContext {
        RequestContext::new(Identity {
            user_id: UserId::new(),
            name: name.into(),
            role,
            department: None,
        })
    }

    async fn notice_owned_by(stores: &Stores, owner: &RequestContext, title: &str) -> Notice {
        let now = Utc::now();
        let notice = Notice {
            id: NoticeId::new(),
            title: title.into(),
            content: "body".into(),
            category: "general".into(),
            department: "Civil".into(),
            priority: Default::default(),
            author: owner.author(),
            created_at: now,
            updated_at: now,
        };
        stores.notices.insert(&notice).await.unwrap();
        notice
    }

    fn draft(notice_id: NoticeId, content: &str, parent: Option<CommentId>) -> CommentDraft {
        CommentDraft {
            notice_id,
            content: content.into(),
            parent_comment_id: parent,
        }
    }

    #[tokio::test]
    async fn test_comment_notifies_owner_room() {
        let f = fixture();
        let a = ctx("A", UserRole::Faculty);
        let b = ctx("B", UserRole::Student);
        let notice = notice_owned_by(&f.stores, &a, "notice 7").await;

        let (conn_a, mut rx_a) = f.engine.connections.register(Some(a.identity.clone()));
        f.engine
            .connections
            .join(&conn_a.id, RoomKey::User(a.user_id()))
            .unwrap();
        let (_conn_b, mut rx_b) = f.engine.connections.register(Some(b.identity.clone()));

        let outcome = f
            .svc
            .create(&b, draft(notice.id, "hi", None))
            .await
            .unwrap();

        let records = f.stores.notifications.list_for_user(a.user_id(), 10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, NotificationKind::NewComment);
        assert_eq!(records[0].message, "B commented on notice 7");
        assert_eq!(outcome.notifications.persisted, vec![records[0].id]);
        assert_eq!(outcome.delivery.targeted, 1);

        let frames: Vec<String> = std::iter::from_fn(|| rx_a.try_recv().ok()).collect();
        assert_eq!(frames.len(), 3);
        assert!(frames[0].contains("\"notification-update\""));
        let targeted: serde_json::Value = serde_json::from_str(&frames[1]).unwrap();
        assert_eq!(targeted["event"], "new-comment");
        assert_eq!(targeted["data"]["message"], "B commented on notice 7");
        assert_eq!(targeted["data"]["notice"]["id"], notice.id.to_string());
        assert_eq!(targeted["data"]["comment"]["content"], "hi");
        let untargeted: serde_json::Value = serde_json::from_str(&frames[2]).unwrap();
        assert_eq!(untargeted["event"], "new-comment");
        assert!(untargeted["data"].is_null());

        let b_frames: Vec<String> = std::iter::from_fn(|| rx_b.try_recv().ok()).collect();
        assert_eq!(b_frames.len(), 2);
    }

    #[tokio::test]
    async fn test_owner_commenting_creates_no_record() {
        let f = fixture();
        let a = ctx("A", UserRole::Faculty);
        let notice = notice_owned_by(&f.stores, &a, "notice 7").await;

        let outcome = f.svc.create(&a, draft(notice.id, "note", None)).await.unwrap();

        assert!(outcome.notifications.records.is_empty());
        assert_eq!(outcome.delivery.targeted, 0);
        assert_eq!(f.stores.notifications.count_unread(a.user_id()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reply_rules() {
        let f = fixture();
        let owner = ctx("Owner", UserRole::Faculty);
        let student = ctx("Sam", UserRole::Student);
        let prof = ctx("Prof", UserRole::Faculty);
        let notice = notice_owned_by(&f.stores, &owner, "Timetable").await;

        let top = f
            .svc
            .create(&student, draft(notice.id, "question", None))
            .await
            .unwrap()
            .entity;

        let err = f
            .svc
            .create(&student, draft(notice.id, "me too", Some(top.id)))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let reply = f
            .svc
            .create(&prof, draft(notice.id, "answer", Some(top.id)))
            .await
            .unwrap();
        assert_eq!(reply.entity.parent_comment_id, Some(top.id));
        let kinds: Vec<_> = reply
            .notifications
            .records
            .iter()
            .map(|r| (r.recipient_id, r.kind))
            .collect();
        assert!(kinds.contains(&(owner.user_id(), NotificationKind::NewComment)));
        assert!(kinds.contains(&(student.user_id(), NotificationKind::CommentReply)));

        let err = f
            .svc
            .create(&prof, draft(notice.id, "nested", Some(reply.entity.id)))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let threads = f.svc.list_for_notice(notice.id).await.unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].replies.len(), 1);
    }

    #[tokio::test]
    async fn test_edit_and_delete_require_author() {
        let f = fixture();
        let owner = ctx("Owner", UserRole::Faculty);
        let b = ctx("B", UserRole::Student);
        let notice = notice_owned_by(&f.stores, &owner, "Timetable").await;
        let comment = f
            .svc
            .create(&b, draft(notice.id, "first", None))
            .await
            .unwrap()
            .entity;

        let err = f
            .svc
            .edit(&owner, comment.id, "hijack".into())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let (_conn, mut rx) = f.engine.connections.register(None);
        let edited = f
            .svc
            .edit(&b, comment.id, "second".into())
            .await
            .unwrap()
            .entity;
        assert!(edited.is_edited);
        assert_eq!(edited.content, "second");
        assert!(rx.try_recv().unwrap().contains("\"notification-update\""));
        assert!(rx.try_recv().unwrap().contains("\"comment-edited\""));

        let admin = ctx("Root", UserRole::Admin);
        let deleted = f.svc.delete(&admin, comment.id).await.unwrap().entity;
        assert_eq!(deleted.id, comment.id);
        rx.try_recv().unwrap();
        let frame: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(frame["event"], "comment-deleted");
        assert_eq!(frame["data"]["id"], comment.id.to_string());
        assert!(f.svc.list_for_notice(notice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_notice_and_empty_content() {
        let f = fixture();
        let b = ctx("B", UserRole::Student);
        let err = f
            .svc
            .create(&b, draft(NoticeId::new(), "hi", None))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let owner = ctx("Owner", UserRole::Faculty);
        let notice = notice_owned_by(&f.stores, &owner, "x").await;
        let err = f.svc.create(&b, draft(notice.id, "  ", None)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
