//! In-memory notification store.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use campusboard_core::result::AppResult;
use campusboard_core::types::id::{NotificationId, UserId};
use campusboard_entity::Notification;

use crate::store::NotificationStore;

/// Notification store held in a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryNotificationStore {
    records: DashMap<NotificationId, Notification>,
}

impl MemoryNotificationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all recipients.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, notification: &Notification) -> AppResult<()> {
        self.records.insert(notification.id, notification.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId, limit: u64) -> AppResult<Vec<Notification>> {
        let mut records: Vec<Notification> = self
            .records
            .iter()
            .filter(|n| n.recipient_id == user_id)
            .map(|n| n.value().clone())
            .collect();
        records.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn count_unread(&self, user_id: UserId) -> AppResult<u64> {
        Ok(self
            .records
            .iter()
            .filter(|n| n.recipient_id == user_id && n.is_unread())
            .count() as u64)
    }

    async fn mark_read(&self, id: NotificationId, user_id: UserId) -> AppResult<bool> {
        match self.records.get_mut(&id) {
            Some(mut record) if record.recipient_id == user_id => {
                record.mark_read();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: UserId) -> AppResult<u64> {
        let now = Utc::now();
        let mut changed = 0;
        for mut record in self.records.iter_mut() {
            if record.recipient_id == user_id && record.is_unread() {
                record.is_read = true;
                record.read_at = Some(now);
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete(&self, id: NotificationId, user_id: UserId) -> AppResult<bool> {
        Ok(self
            .records
            .remove_if(&id, |_, record| record.recipient_id == user_id)
            .is_some())
    }
}
