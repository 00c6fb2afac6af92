//! PostgreSQL store adapters.
//!
//! Each adapter reads into a flat row struct and converts it into the
//! domain entity.

pub mod comment;
pub mod notice;
pub mod notification;

pub use comment::PgCommentStore;
pub use notice::PgNoticeStore;
pub use notification::PgNotificationStore;

use campusboard_core::error::{AppError, ErrorKind};
use campusboard_core::types::id::UserId;
use campusboard_entity::{Author, UserRole};

/// Map a sqlx error into an [`AppError`] with context.
pub(crate) fn db_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}

/// Rebuild the denormalized author columns into an [`Author`].
pub(crate) fn author_from_columns(
    id: UserId,
    name: String,
    role: &str,
    department: Option<String>,
) -> Result<Author, AppError> {
    Ok(Author {
        id,
        name,
        role: role.parse::<UserRole>()?,
        department,
    })
}
