//! # campusboard-database
//!
//! Durable store seams for notices, comments and notification records,
//! with a PostgreSQL implementation and a process-local one.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod store;

pub use connection::DatabasePool;
pub use store::{CommentStore, NoticeStore, NotificationStore, Stores};
