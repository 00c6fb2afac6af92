//! Room keys and membership tracking.

pub mod key;
pub mod registry;

pub use key::RoomKey;
pub use registry::RoomRegistry;
