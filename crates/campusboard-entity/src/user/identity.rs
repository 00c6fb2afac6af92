//! Verified caller identity and the author snapshot embedded in content.

use campusboard_core::types::id::UserId;
use serde::{Deserialize, Serialize};

use super::role::UserRole;

/// A caller identity verified by the external auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// The user id.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Role at the time the token was issued.
    pub role: UserRole,
    /// Home department, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl Identity {
    /// Snapshot of this identity for embedding in notices and comments.
    pub fn author(&self) -> Author {
        Author {
            id: self.user_id,
            name: self.name.clone(),
            role: self.role,
            department: self.department.clone(),
        }
    }

    /// Whether the caller may modify content written by `owner`.
    pub fn can_modify(&self, owner: UserId) -> bool {
        self.user_id == owner || self.role.is_admin()
    }
}

/// Author details denormalized into notices and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// Author user id.
    pub id: UserId,
    /// Display name at the time of writing.
    pub name: String,
    /// Role at the time of writing.
    pub role: UserRole,
    /// Department at the time of writing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}
