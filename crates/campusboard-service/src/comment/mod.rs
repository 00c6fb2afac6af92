//! Comment CRUD with notification fan-out.

pub mod service;

pub use service::{CommentDraft, CommentService};
