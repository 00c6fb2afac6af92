//! In-memory comment store.

use async_trait::async_trait;
use dashmap::DashMap;

use campusboard_core::result::AppResult;
use campusboard_core::types::id::{CommentId, NoticeId};
use campusboard_entity::Comment;

use crate::store::{CommentStore, nest_replies};

/// Comment store held in a concurrent map. Comments are kept flat and
/// nested on read.
#[derive(Debug, Default)]
pub struct MemoryCommentStore {
    comments: DashMap<CommentId, Comment>,
}

impl MemoryCommentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    async fn insert(&self, comment: &Comment) -> AppResult<()> {
        let mut flat = comment.clone();
        flat.replies.clear();
        self.comments.insert(flat.id, flat);
        Ok(())
    }

    async fn update(&self, comment: &Comment) -> AppResult<bool> {
        match self.comments.get_mut(&comment.id) {
            Some(mut entry) => {
                entry.content = comment.content.clone();
                entry.is_edited = comment.is_edited;
                entry.updated_at = comment.updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: CommentId) -> AppResult<bool> {
        let removed = self.comments.remove(&id).is_some();
        if removed {
            self.comments
                .retain(|_, c| c.parent_comment_id != Some(id));
        }
        Ok(removed)
    }

    async fn delete_for_notice(&self, notice_id: NoticeId) -> AppResult<u64> {
        let before = self.comments.len();
        self.comments.retain(|_, c| c.notice_id != notice_id);
        Ok((before - self.comments.len()) as u64)
    }

    async fn find(&self, id: CommentId) -> AppResult<Option<Comment>> {
        Ok(self.comments.get(&id).map(|c| c.value().clone()))
    }

    async fn list_for_notice(&self, notice_id: NoticeId) -> AppResult<Vec<Comment>> {
        let flat: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| c.notice_id == notice_id)
            .map(|c| c.value().clone())
            .collect();
        Ok(nest_replies(flat))
    }
}
