//! # campusboard-entity
//!
//! Domain entity models for Campus Board. Every struct in this crate is a
//! value object that crosses the REST or live boundary as camelCase JSON.
//! Store adapters map their own row types into these.

pub mod comment;
pub mod event;
pub mod notice;
pub mod notification;
pub mod user;

pub use comment::Comment;
pub use event::DomainEvent;
pub use notice::{Notice, NoticePriority};
pub use notification::{Notification, NotificationKind};
pub use user::{Author, Identity, UserRole};
