//! Convenience result type alias for Campus Board.

use crate::error::AppError;

/// A specialized `Result` type for Campus Board operations.
pub type AppResult<T> = Result<T, AppError>;
