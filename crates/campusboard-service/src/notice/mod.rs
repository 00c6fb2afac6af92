//! Notice CRUD.

pub mod service;

pub use service::{NoticeChanges, NoticeDraft, NoticeService};
