//! Per-session notification store.

pub mod center;
pub mod view;

pub use center::{NotificationCenter, Session};
pub use view::{ItemKey, LoadState, NotificationItem, NotificationView};
