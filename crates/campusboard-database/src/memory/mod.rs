//! Process-local store adapters backed by `DashMap`.
//!
//! Used by the `memory` store backend and by tests.

pub mod comment;
pub mod notice;
pub mod notification;

pub use comment::MemoryCommentStore;
pub use notice::MemoryNoticeStore;
pub use notification::MemoryNotificationStore;
