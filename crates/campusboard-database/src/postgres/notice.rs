//! PostgreSQL notice store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use campusboard_core::error::AppError;
use campusboard_core::result::AppResult;
use campusboard_core::types::id::{NoticeId, UserId};
use campusboard_entity::notice::ALL_DEPARTMENTS;
use campusboard_entity::{Notice, NoticePriority};

use super::{author_from_columns, db_err};
use crate::store::NoticeStore;

#[derive(Debug, FromRow)]
struct NoticeRow {
    id: NoticeId,
    title: String,
    content: String,
    category: String,
    department: String,
    priority: String,
    author_id: UserId,
    author_name: String,
    author_role: String,
    author_department: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<NoticeRow> for Notice {
    type Error = AppError;

    fn try_from(row: NoticeRow) -> Result<Self, Self::Error> {
        Ok(Notice {
            id: row.id,
            title: row.title,
            content: row.content,
            category: row.category,
            department: row.department,
            priority: NoticePriority::from_stored(&row.priority),
            author: author_from_columns(
                row.author_id,
                row.author_name,
                &row.author_role,
                row.author_department,
            )?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Notice store over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgNoticeStore {
    pool: PgPool,
}

impl PgNoticeStore {
    /// Create a new notice store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoticeStore for PgNoticeStore {
    async fn insert(&self, notice: &Notice) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO notices (id, title, content, category, department, priority, \
             author_id, author_name, author_role, author_department, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(notice.id)
        .bind(&notice.title)
        .bind(&notice.content)
        .bind(&notice.category)
        .bind(&notice.department)
        .bind(notice.priority.as_str())
        .bind(notice.author.id)
        .bind(&notice.author.name)
        .bind(notice.author.role.as_str())
        .bind(&notice.author.department)
        .bind(notice.created_at)
        .bind(notice.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to insert notice"))?;
        Ok(())
    }

    async fn update(&self, notice: &Notice) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notices SET title = $2, content = $3, category = $4, department = $5, \
             priority = $6, updated_at = $7 WHERE id = $1",
        )
        .bind(notice.id)
        .bind(&notice.title)
        .bind(&notice.content)
        .bind(&notice.category)
        .bind(&notice.department)
        .bind(notice.priority.as_str())
        .bind(notice.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to update notice"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: NoticeId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to delete notice"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, id: NoticeId) -> AppResult<Option<Notice>> {
        sqlx::query_as::<_, NoticeRow>("SELECT * FROM notices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find notice"))?
            .map(Notice::try_from)
            .transpose()
    }

    async fn list(&self, department: Option<&str>, limit: u64) -> AppResult<Vec<Notice>> {
        let rows = match department.filter(|d| *d != ALL_DEPARTMENTS) {
            Some(department) => sqlx::query_as::<_, NoticeRow>(
                "SELECT * FROM notices WHERE department = $1 OR department = $2 \
                 ORDER BY created_at DESC, id DESC LIMIT $3",
            )
            .bind(department)
            .bind(ALL_DEPARTMENTS)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await,
            None => sqlx::query_as::<_, NoticeRow>(
                "SELECT * FROM notices ORDER BY created_at DESC, id DESC LIMIT $1",
            )
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await,
        }
        .map_err(db_err("Failed to list notices"))?;

        rows.into_iter().map(Notice::try_from).collect()
    }
}
