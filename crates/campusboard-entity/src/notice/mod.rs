//! Notice domain entities.

pub mod model;
pub mod priority;

pub use model::{ALL_DEPARTMENTS, Notice};
pub use priority::NoticePriority;
