//! Query string parameters shared by listing endpoints.

use serde::Deserialize;

/// `?limit=N`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitQuery {
    /// Requested page size, clamped by the service.
    pub limit: Option<u64>,
}

/// `?department=D&limit=N` for the public notice feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQuery {
    /// Department filter. `All Departments` or absent means no filter.
    pub department: Option<String>,
    /// Requested page size.
    pub limit: Option<u64>,
}
