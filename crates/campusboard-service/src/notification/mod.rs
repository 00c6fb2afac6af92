//! Notification records: who gets one, writing them, and reading them back.

pub mod rules;
pub mod service;
pub mod writer;

pub use rules::{Recipient, comment_recipients};
pub use service::{NotificationListing, NotificationService, NotificationWithNotice};
pub use writer::{NotificationWriter, NotifyOutcome};
