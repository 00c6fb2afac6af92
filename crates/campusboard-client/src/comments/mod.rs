//! Per-notice comment stream.

pub mod stream;
pub mod view;

pub use stream::CommentStream;
pub use view::{CommentState, CommentView};
