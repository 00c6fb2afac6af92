//! User domain values.

pub mod identity;
pub mod role;

pub use identity::{Author, Identity};
pub use role::UserRole;
