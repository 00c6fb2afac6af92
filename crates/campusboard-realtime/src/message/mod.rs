//! Wire protocol for the live connection.

pub mod types;
pub mod validator;

pub use types::{ClientEvent, CommentUpdate, ServerEvent};
