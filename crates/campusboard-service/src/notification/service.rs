//! Reading and acknowledging a user's notification records.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use campusboard_core::config::NotificationsConfig;
use campusboard_core::error::AppError;
use campusboard_core::result::AppResult;
use campusboard_core::types::id::{NoticeId, NotificationId};
use campusboard_database::{NoticeStore, NotificationStore};
use campusboard_entity::{Notice, Notification};

use crate::context::RequestContext;

/// A record with the notice it refers to, when that notice still exists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationWithNotice {
    /// The record itself.
    #[serde(flatten)]
    pub notification: Notification,
    /// The referenced notice. `None` once the notice was deleted.
    pub related_notice: Option<Notice>,
}

/// One page of records plus the caller's unread total.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListing {
    /// Newest first.
    pub items: Vec<NotificationWithNotice>,
    /// Unread records across all pages.
    pub unread_count: u64,
}

/// Per-user notification queries and read-state changes.
#[derive(Debug, Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    notices: Arc<dyn NoticeStore>,
    config: NotificationsConfig,
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(
        store: Arc<dyn NotificationStore>,
        notices: Arc<dyn NoticeStore>,
        config: NotificationsConfig,
    ) -> Self {
        Self {
            store,
            notices,
            config,
        }
    }

    /// Lists the caller's records, newest first.
    ///
    /// References to deleted notices are kept and resolve to `None`.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        limit: Option<u64>,
    ) -> AppResult<NotificationListing> {
        let limit = self.config.clamp_limit(limit);
        let records = self.store.list_for_user(ctx.user_id(), limit).await?;
        let unread_count = self.store.count_unread(ctx.user_id()).await?;

        let mut related: HashMap<NoticeId, Option<Notice>> = HashMap::new();
        for notice_id in records.iter().filter_map(|r| r.notice_id) {
            if related.contains_key(&notice_id) {
                continue;
            }
            let notice = match self.notices.find(notice_id).await {
                Ok(notice) => notice,
                Err(e) => {
                    warn!(notice_id = %notice_id, error = %e, "Failed to resolve notice for notification");
                    None
                }
            };
            related.insert(notice_id, notice);
        }

        let items = records
            .into_iter()
            .map(|notification| {
                let related_notice = notification
                    .notice_id
                    .and_then(|id| related.get(&id).cloned().flatten());
                NotificationWithNotice {
                    notification,
                    related_notice,
                }
            })
            .collect();

        Ok(NotificationListing {
            items,
            unread_count,
        })
    }

    /// The caller's unread total.
    pub async fn unread_count(&self, ctx: &RequestContext) -> AppResult<u64> {
        self.store.count_unread(ctx.user_id()).await
    }

    /// Marks one of the caller's records read.
    pub async fn mark_read(&self, ctx: &RequestContext, id: NotificationId) -> AppResult<()> {
        if !self.store.mark_read(id, ctx.user_id()).await? {
            return Err(AppError::not_found("Notification not found"));
        }
        Ok(())
    }

    /// Marks all of the caller's records read. Returns how many changed.
    pub async fn mark_all_read(&self, ctx: &RequestContext) -> AppResult<u64> {
        let changed = self.store.mark_all_read(ctx.user_id()).await?;
        info!(user_id = %ctx.user_id(), changed, "Marked all notifications read");
        Ok(changed)
    }

    /// Deletes one of the caller's records.
    pub async fn delete(&self, ctx: &RequestContext, id: NotificationId) -> AppResult<()> {
        if !self.store.delete(id, ctx.user_id()).await? {
            return Err(AppError::not_found("Notification not found"));
        }
        Ok(())
    }
}
