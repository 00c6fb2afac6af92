//! PostgreSQL notification store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use campusboard_core::error::AppError;
use campusboard_core::result::AppResult;
use campusboard_core::types::id::{CommentId, NoticeId, NotificationId, UserId};
use campusboard_entity::{Notification, NotificationKind};

use super::db_err;
use crate::store::NotificationStore;

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: NotificationId,
    recipient_id: UserId,
    actor_id: Option<UserId>,
    kind: String,
    title: String,
    message: String,
    notice_id: Option<NoticeId>,
    comment_id: Option<CommentId>,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.id,
            recipient_id: row.recipient_id,
            actor_id: row.actor_id,
            kind: row.kind.parse::<NotificationKind>()?,
            title: row.title,
            message: row.message,
            notice_id: row.notice_id,
            comment_id: row.comment_id,
            is_read: row.is_read,
            read_at: row.read_at,
            created_at: row.created_at,
        })
    }
}

/// Notification store over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    /// Create a new notification store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn insert(&self, notification: &Notification) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO notifications (id, recipient_id, actor_id, kind, title, message, \
             notice_id, comment_id, is_read, read_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(notification.id)
        .bind(notification.recipient_id)
        .bind(notification.actor_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.notice_id)
        .bind(notification.comment_id)
        .bind(notification.is_read)
        .bind(notification.read_at)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to create notification"))?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId, limit: u64) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE recipient_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list notifications"))?;

        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn count_unread(&self, user_id: UserId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to count unread"))?;
        Ok(count.max(0) as u64)
    }

    async fn mark_read(&self, id: NotificationId, user_id: UserId) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = COALESCE(read_at, NOW()) \
             WHERE id = $1 AND recipient_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to mark read"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: UserId) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = NOW() \
             WHERE recipient_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to mark all read"))?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: NotificationId, user_id: UserId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND recipient_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to delete notification"))?;
        Ok(result.rows_affected() > 0)
    }
}
