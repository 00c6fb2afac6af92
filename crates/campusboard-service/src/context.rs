//! Request context carrying the verified caller.

use chrono::{DateTime, Utc};

use campusboard_core::error::AppError;
use campusboard_core::types::id::UserId;
use campusboard_entity::{Author, Identity};

/// Context for the current authenticated request.
///
/// Built by the API extractor and passed into service methods so that
/// every operation knows who is acting.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The verified caller.
    pub identity: Identity,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            request_time: Utc::now(),
        }
    }

    /// The caller's user ID.
    pub fn user_id(&self) -> UserId {
        self.identity.user_id
    }

    /// The caller as an author snapshot.
    pub fn author(&self) -> Author {
        self.identity.author()
    }

    /// Returns whether the current user is an admin.
    pub fn is_admin(&self) -> bool {
        self.identity.role.is_admin()
    }

    /// Fails unless the caller may publish notices and replies.
    pub fn require_publisher(&self, action: &str) -> Result<(), AppError> {
        if self.identity.role.can_publish() {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "Only faculty and administrators can {action}"
            )))
        }
    }

    /// Fails unless the caller owns the content or is an admin.
    pub fn require_owner(&self, owner: UserId, what: &str) -> Result<(), AppError> {
        if self.identity.can_modify(owner) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("Not allowed to modify this {what}")))
        }
    }
}
