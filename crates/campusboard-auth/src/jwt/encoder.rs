//! JWT token creation for tooling and tests.

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use campusboard_core::config::AuthConfig;
use campusboard_core::error::AppError;
use campusboard_entity::Identity;

use super::claims::Claims;

/// Creates signed bearer tokens for a given identity.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    ttl_minutes: i64,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl_minutes: config.token_ttl_minutes,
        }
    }

    /// Issues a token for the identity with the configured lifetime.
    pub fn issue(&self, identity: &Identity) -> Result<String, AppError> {
        self.issue_with_ttl(identity, chrono::Duration::minutes(self.ttl_minutes))
    }

    /// Issues a token for the identity with an explicit lifetime.
    ///
    /// A negative lifetime produces an already expired token.
    pub fn issue_with_ttl(
        &self,
        identity: &Identity,
        ttl: chrono::Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity.user_id,
            name: identity.name.clone(),
            role: identity.role,
            department: identity.department.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))
    }
}
