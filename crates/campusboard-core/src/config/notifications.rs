//! Notification listing configuration.

use serde::{Deserialize, Serialize};

/// Limits applied to notification and public feed listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Page size when `limit` is omitted.
    #[serde(default = "default_limit")]
    pub default_limit: u64,
    /// Upper bound for any requested `limit`.
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,
    /// Page size of the public notice feed when `limit` is omitted.
    #[serde(default = "default_feed_limit")]
    pub public_feed_limit: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            public_feed_limit: default_feed_limit(),
        }
    }
}

impl NotificationsConfig {
    /// Resolves a requested limit against the configured bounds.
    pub fn clamp_limit(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }

    /// Resolves a requested public feed limit against the configured bounds.
    pub fn clamp_feed_limit(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.public_feed_limit)
            .clamp(1, self.max_limit.max(1))
    }
}

fn default_limit() -> u64 {
    10
}

fn default_max_limit() -> u64 {
    100
}

fn default_feed_limit() -> u64 {
    20
}
