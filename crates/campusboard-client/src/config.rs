//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use campusboard_entity::notice::ALL_DEPARTMENTS;

/// Where the board lives and how the client views behave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// REST base, e.g. `http://localhost:5000/api`.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Live endpoint, e.g. `ws://localhost:5000/ws`.
    #[serde(default = "default_socket_url")]
    pub socket_url: String,
    /// Bound on every REST call.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Number of items the notification view keeps.
    #[serde(default = "default_window")]
    pub window: usize,
    /// Department used for the public feed when signed out.
    #[serde(default = "default_public_department")]
    pub public_department: String,
    /// Number of notices fetched for the public feed.
    #[serde(default = "default_public_feed_limit")]
    pub public_feed_limit: u64,
    /// Buffer of the live connection's event queues.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,
    /// Reconnect attempts after the live connection drops. Zero disables reconnect.
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,
    /// Wait before each reconnect attempt.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            socket_url: default_socket_url(),
            request_timeout_seconds: default_request_timeout(),
            window: default_window(),
            public_department: default_public_department(),
            public_feed_limit: default_public_feed_limit(),
            channel_buffer: default_channel_buffer(),
            reconnect_attempts: default_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay(),
        }
    }
}

impl ClientConfig {
    /// The REST timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

fn default_api_base() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_socket_url() -> String {
    "ws://localhost:5000/ws".to_string()
}

fn default_request_timeout() -> u64 {
    5
}

fn default_window() -> usize {
    10
}

fn default_public_department() -> String {
    ALL_DEPARTMENTS.to_string()
}

fn default_public_feed_limit() -> u64 {
    5
}

fn default_channel_buffer() -> usize {
    64
}

fn default_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_delay() -> u64 {
    1000
}
