//! Message validation rules.

use campusboard_core::error::AppError;

/// Maximum allowed message size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 65_536;

/// Maximum length of relayed comment content, in characters.
pub const MAX_COMMENT_LENGTH: usize = 2_000;

/// Validates a raw inbound frame before parsing.
pub fn validate_inbound(raw: &str) -> Result<(), AppError> {
    if raw.len() > MAX_MESSAGE_SIZE {
        return Err(AppError::validation(format!(
            "Message exceeds maximum size of {MAX_MESSAGE_SIZE} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty message"));
    }

    Ok(())
}

/// Validates comment content carried by a relay frame.
pub fn validate_comment_content(content: &str) -> Result<(), AppError> {
    if content.trim().is_empty() {
        return Err(AppError::validation("Comment content is empty"));
    }
    if content.chars().count() > MAX_COMMENT_LENGTH {
        return Err(AppError::validation(format!(
            "Comment exceeds {MAX_COMMENT_LENGTH} characters"
        )));
    }
    Ok(())
}
