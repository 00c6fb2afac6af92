//! JWT claims carried by campus bearer tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campusboard_core::types::id::UserId;
use campusboard_entity::{Identity, UserRole};

/// Claims payload of a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user ID.
    pub sub: UserId,
    /// Display name.
    pub name: String,
    /// User role at the time of issuance.
    pub role: UserRole,
    /// Home department.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Token ID.
    pub jti: Uuid,
}

impl Claims {
    /// Returns the user ID from the subject claim.
    pub fn user_id(&self) -> UserId {
        self.sub
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    /// The verified identity these claims describe.
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.sub,
            name: self.name.clone(),
            role: self.role,
            department: self.department.clone(),
        }
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Identity {
            user_id: claims.sub,
            name: claims.name,
            role: claims.role,
            department: claims.department,
        }
    }
}
