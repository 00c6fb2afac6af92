//! In-process fakes for the client's REST and live seams.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, Notify};

use campusboard_core::types::id::{CommentId, NoticeId, NotificationId, UserId};
use campusboard_entity::notice::ALL_DEPARTMENTS;
use campusboard_entity::{Author, Comment, Identity, Notice, NoticePriority, UserRole};

use crate::api::{BoardApi, NotificationPage};
use crate::error::{ClientError, ClientResult};
use crate::live::{Connector, LiveConnection, RemotePeer};

pub fn identity(name: &str, role: UserRole) -> Identity {
    Identity {
        user_id: UserId::new(),
        name: name.to_string(),
        role,
        department: None,
    }
}

pub fn notice(title: &str, owner: &Identity) -> Notice {
    let now = Utc::now();
    Notice {
        id: NoticeId::new(),
        title: title.to_string(),
        content: "body".to_string(),
        category: "general".to_string(),
        department: ALL_DEPARTMENTS.to_string(),
        priority: NoticePriority::Medium,
        author: owner.author(),
        created_at: now,
        updated_at: now,
    }
}

pub fn comment(notice_id: NoticeId, author: &Author, content: &str) -> Comment {
    let now = Utc::now();
    Comment {
        id: CommentId::new(),
        notice_id,
        parent_comment_id: None,
        content: content.to_string(),
        author: author.clone(),
        is_edited: false,
        replies: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

/// Scriptable [`BoardApi`].
#[derive(Default)]
pub struct FakeApi {
    pub page: Mutex<Option<NotificationPage>>,
    pub public: Mutex<Vec<Notice>>,
    pub comments: Mutex<Vec<Comment>>,
    pub fail: AtomicBool,
    pub gate: Option<Arc<Notify>>,
    pub read_calls: Mutex<Vec<NotificationId>>,
    pub read_all_calls: Mutex<u32>,
    pub deleted: Mutex<Vec<NotificationId>>,
    pub public_departments: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    async fn enter(&self) -> ClientResult<()> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Transport("offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl BoardApi for FakeApi {
    async fn notifications(&self, _token: &str, _limit: u64) -> ClientResult<NotificationPage> {
        self.enter().await?;
        self.page.lock().await.clone().ok_or(ClientError::Status {
            status: 401,
            message: "Invalid token".into(),
        })
    }

    async fn public_notices(&self, department: &str, limit: u64) -> ClientResult<Vec<Notice>> {
        self.enter().await?;
        self.public_departments.lock().await.push(department.to_string());
        let notices = self.public.lock().await;
        Ok(notices.iter().take(limit as usize).cloned().collect())
    }

    async fn mark_read(&self, _token: &str, id: NotificationId) -> ClientResult<()> {
        self.read_calls.lock().await.push(id);
        if let Some(page) = self.page.lock().await.as_mut() {
            for item in &mut page.items {
                if item.notification.id == id && !item.notification.is_read {
                    item.notification.is_read = true;
                    page.unread_count = page.unread_count.saturating_sub(1);
                }
            }
        }
        Ok(())
    }

    async fn mark_all_read(&self, _token: &str) -> ClientResult<()> {
        *self.read_all_calls.lock().await += 1;
        if let Some(page) = self.page.lock().await.as_mut() {
            for item in &mut page.items {
                item.notification.is_read = true;
            }
            page.unread_count = 0;
        }
        Ok(())
    }

    async fn delete_notification(&self, _token: &str, id: NotificationId) -> ClientResult<()> {
        self.deleted.lock().await.push(id);
        Ok(())
    }

    async fn comments(&self, _notice_id: NoticeId) -> ClientResult<Vec<Comment>> {
        self.enter().await?;
        Ok(self.comments.lock().await.clone())
    }

    async fn create_comment(
        &self,
        _token: &str,
        notice_id: NoticeId,
        content: &str,
        parent_comment_id: Option<CommentId>,
    ) -> ClientResult<Comment> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 400,
                message: "rejected".into(),
            });
        }
        let author = identity("Writer", UserRole::Student).author();
        let mut created = comment(notice_id, &author, content);
        created.parent_comment_id = parent_comment_id;
        Ok(created)
    }

    async fn edit_comment(&self, _token: &str, id: CommentId, content: &str) -> ClientResult<Comment> {
        let comments = self.comments.lock().await;
        let mut edited = comments
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(ClientError::Status {
                status: 404,
                message: "Comment not found".into(),
            })?;
        edited.content = content.to_string();
        edited.is_edited = true;
        Ok(edited)
    }

    async fn delete_comment(&self, _token: &str, id: CommentId) -> ClientResult<Comment> {
        let comments = self.comments.lock().await;
        comments
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(ClientError::Status {
                status: 404,
                message: "Comment not found".into(),
            })
    }
}

/// [`Connector`] that keeps the server side of every connection.
#[derive(Default)]
pub struct FakeConnector {
    pub peers: Mutex<Vec<RemotePeer>>,
    pub tokens: Mutex<Vec<Option<String>>>,
}

impl FakeConnector {
    pub async fn peer_count(&self) -> usize {
        self.peers.lock().await.len()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, token: Option<&str>) -> ClientResult<LiveConnection> {
        let (connection, peer) = LiveConnection::pair(16);
        self.peers.lock().await.push(peer);
        self.tokens.lock().await.push(token.map(str::to_string));
        Ok(connection)
    }
}
