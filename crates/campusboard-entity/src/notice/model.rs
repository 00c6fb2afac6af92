//! Notice entity model.

use campusboard_core::types::id::NoticeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::priority::NoticePriority;
use crate::user::Author;

/// Department value that addresses every department.
pub const ALL_DEPARTMENTS: &str = "All Departments";

/// A notice posted to the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    /// Unique notice identifier.
    pub id: NoticeId,
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Free-form category such as `exam` or `event`.
    pub category: String,
    /// Target department, or [`ALL_DEPARTMENTS`].
    pub department: String,
    /// Display priority.
    #[serde(default)]
    pub priority: NoticePriority,
    /// Who posted it. The notice owner.
    pub author: Author,
    /// When the notice was created.
    pub created_at: DateTime<Utc>,
    /// When the notice was last edited.
    pub updated_at: DateTime<Utc>,
}

impl Notice {
    /// Whether this notice is visible under a department filter.
    ///
    /// Notices addressed to all departments match every filter, and the
    /// all-departments filter matches every notice.
    pub fn visible_in(&self, department: &str) -> bool {
        department == ALL_DEPARTMENTS
            || self.department == ALL_DEPARTMENTS
            || self.department == department
    }
}
