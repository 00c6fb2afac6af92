//! # campusboard-client
//!
//! Client-resident state for Campus Board: the per-session
//! notification store and the per-notice comment stream, plus the REST
//! and live transports they run on.
//!
//! The merge logic lives in plain state types ([`NotificationView`],
//! [`CommentView`]) that are independent of arrival order. The async
//! owners ([`NotificationCenter`], [`CommentStream`]) drive them from
//! REST snapshots and live events and own exactly one connection each.

pub mod api;
pub mod comments;
pub mod config;
pub mod error;
pub mod live;
pub mod liveness;
pub mod notifications;

pub use api::{BoardApi, HttpBoardApi, NotificationPage, RemoteNotification};
pub use comments::{CommentState, CommentStream, CommentView};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use live::{Connector, LiveConnection, LiveEvents, LiveHandle, RemotePeer, WsConnector};
pub use liveness::{Liveness, LivenessGuard};
pub use notifications::{
    ItemKey, LoadState, NotificationCenter, NotificationItem, NotificationView, Session,
};

#[cfg(test)]
pub(crate) mod testing;
