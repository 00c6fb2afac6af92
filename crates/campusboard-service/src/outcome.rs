//! Result of a write that fans out.

use serde::Serialize;

use campusboard_realtime::DeliveryReport;

use crate::notification::NotifyOutcome;

/// A committed write together with its two independent side effects:
/// persisted notification records and live push delivery.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome<T> {
    /// The committed entity.
    pub entity: T,
    /// Notification records built for the write.
    pub notifications: NotifyOutcome,
    /// Push delivery counts.
    pub delivery: DeliveryReport,
}

impl<T> WriteOutcome<T> {
    /// Outcome of a write that produces no notification records.
    pub fn without_notifications(entity: T, delivery: DeliveryReport) -> Self {
        Self {
            entity,
            notifications: NotifyOutcome::default(),
            delivery,
        }
    }
}
