//! In-memory notice store.

use async_trait::async_trait;
use dashmap::DashMap;

use campusboard_core::result::AppResult;
use campusboard_core::types::id::NoticeId;
use campusboard_entity::Notice;

use crate::store::NoticeStore;

/// Notice store held in a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryNoticeStore {
    notices: DashMap<NoticeId, Notice>,
}

impl MemoryNoticeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoticeStore for MemoryNoticeStore {
    async fn insert(&self, notice: &Notice) -> AppResult<()> {
        self.notices.insert(notice.id, notice.clone());
        Ok(())
    }

    async fn update(&self, notice: &Notice) -> AppResult<bool> {
        match self.notices.get_mut(&notice.id) {
            Some(mut entry) => {
                *entry = notice.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: NoticeId) -> AppResult<bool> {
        Ok(self.notices.remove(&id).is_some())
    }

    async fn find(&self, id: NoticeId) -> AppResult<Option<Notice>> {
        Ok(self.notices.get(&id).map(|n| n.value().clone()))
    }

    async fn list(&self, department: Option<&str>, limit: u64) -> AppResult<Vec<Notice>> {
        let mut notices: Vec<Notice> = self
            .notices
            .iter()
            .filter(|n| department.is_none_or(|d| n.visible_in(d)))
            .map(|n| n.value().clone())
            .collect();
        notices.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        notices.truncate(limit as usize);
        Ok(notices)
    }
}
