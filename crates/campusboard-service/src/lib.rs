//! # campusboard-service
//!
//! Business logic for Campus Board. Every write goes store first, then
//! notification records, then push events.

pub mod comment;
pub mod context;
pub mod notice;
pub mod notification;
pub mod outcome;

use std::sync::Arc;

use campusboard_core::config::NotificationsConfig;
use campusboard_database::Stores;
use campusboard_realtime::EventEmitter;

pub use comment::{CommentDraft, CommentService};
pub use context::RequestContext;
pub use notice::{NoticeChanges, NoticeDraft, NoticeService};
pub use notification::{NotificationService, NotificationWriter, NotifyOutcome};
pub use outcome::WriteOutcome;

/// All services, wired to one set of stores and one emitter.
#[derive(Debug, Clone)]
pub struct Services {
    /// Notice CRUD.
    pub notices: Arc<NoticeService>,
    /// Comment CRUD with notification fan-out.
    pub comments: Arc<CommentService>,
    /// Per-user notification records.
    pub notifications: Arc<NotificationService>,
}

impl Services {
    /// Builds every service over the given stores.
    pub fn new(stores: &Stores, emitter: Arc<EventEmitter>, config: &NotificationsConfig) -> Self {
        let writer = Arc::new(NotificationWriter::new(stores.notifications.clone()));
        Self {
            notices: Arc::new(NoticeService::new(
                stores.notices.clone(),
                stores.comments.clone(),
                emitter.clone(),
                config.clone(),
            )),
            comments: Arc::new(CommentService::new(
                stores.comments.clone(),
                stores.notices.clone(),
                writer,
                emitter,
            )),
            notifications: Arc::new(NotificationService::new(
                stores.notifications.clone(),
                stores.notices.clone(),
                config.clone(),
            )),
        }
    }
}
