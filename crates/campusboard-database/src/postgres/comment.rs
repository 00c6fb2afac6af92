//! PostgreSQL comment store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use campusboard_core::error::AppError;
use campusboard_core::result::AppResult;
use campusboard_core::types::id::{CommentId, NoticeId, UserId};
use campusboard_entity::Comment;

use super::{author_from_columns, db_err};
use crate::store::{CommentStore, nest_replies};

#[derive(Debug, FromRow)]
struct CommentRow {
    id: CommentId,
    notice_id: NoticeId,
    parent_comment_id: Option<CommentId>,
    content: String,
    author_id: UserId,
    author_name: String,
    author_role: String,
    author_department: Option<String>,
    is_edited: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = AppError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        Ok(Comment {
            id: row.id,
            notice_id: row.notice_id,
            parent_comment_id: row.parent_comment_id,
            content: row.content,
            author: author_from_columns(
                row.author_id,
                row.author_name,
                &row.author_role,
                row.author_department,
            )?,
            is_edited: row.is_edited,
            replies: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Comment store over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgCommentStore {
    pool: PgPool,
}

impl PgCommentStore {
    /// Create a new comment store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn insert(&self, comment: &Comment) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO comments (id, notice_id, parent_comment_id, content, author_id, \
             author_name, author_role, author_department, is_edited, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(comment.id)
        .bind(comment.notice_id)
        .bind(comment.parent_comment_id)
        .bind(&comment.content)
        .bind(comment.author.id)
        .bind(&comment.author.name)
        .bind(comment.author.role.as_str())
        .bind(&comment.author.department)
        .bind(comment.is_edited)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to insert comment"))?;
        Ok(())
    }

    async fn update(&self, comment: &Comment) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE comments SET content = $2, is_edited = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(comment.id)
        .bind(&comment.content)
        .bind(comment.is_edited)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to update comment"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: CommentId) -> AppResult<bool> {
        // Replies go with the parent through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to delete comment"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_notice(&self, notice_id: NoticeId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM comments WHERE notice_id = $1")
            .bind(notice_id)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to delete notice comments"))?;
        Ok(result.rows_affected())
    }

    async fn find(&self, id: CommentId) -> AppResult<Option<Comment>> {
        sqlx::query_as::<_, CommentRow>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find comment"))?
            .map(Comment::try_from)
            .transpose()
    }

    async fn list_for_notice(&self, notice_id: NoticeId) -> AppResult<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            "SELECT * FROM comments WHERE notice_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(notice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list comments"))?;

        let flat = rows
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nest_replies(flat))
    }
}
