//! HTTP and WebSocket handlers.

pub mod comment;
pub mod health;
pub mod notice;
pub mod notification;
pub mod ws;
