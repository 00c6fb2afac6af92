//! Custom Axum extractors.

pub mod auth;
pub mod query;

pub use auth::{AuthUser, bearer_token};
pub use query::{FeedQuery, LimitQuery};
