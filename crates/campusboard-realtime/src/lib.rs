//! # campusboard-realtime
//!
//! The live side of Campus Board: a connection pool and room registry
//! that make up the event bus, the JSON wire protocol spoken over it, and
//! the emitter that turns committed domain writes into push events.

pub mod connection;
pub mod emitter;
pub mod message;
pub mod room;
pub mod server;

pub use connection::handle::{ConnectionHandle, ConnectionId};
pub use connection::manager::ConnectionManager;
pub use emitter::{DeliveryReport, EventEmitter, PushTarget};
pub use message::types::{ClientEvent, CommentUpdate, ServerEvent};
pub use room::RoomKey;
pub use server::RealtimeEngine;
