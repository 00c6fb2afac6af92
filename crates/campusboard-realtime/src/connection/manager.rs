//! Connection manager: connection lifecycle, room membership and delivery.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use campusboard_core::config::RealtimeConfig;
use campusboard_core::error::{AppError, ErrorKind};
use campusboard_entity::Identity;

use crate::message::types::{ClientEvent, CommentUpdate, ServerEvent};
use crate::message::validator::{validate_comment_content, validate_inbound};
use crate::room::{RoomKey, RoomRegistry};

use super::handle::{ConnectionHandle, ConnectionId};
use super::pool::ConnectionPool;

/// Manages all active live connections and their rooms.
///
/// This is the event bus: it knows who is connected and who joined what,
/// and nothing about notices or comments beyond routing relay frames.
#[derive(Debug)]
pub struct ConnectionManager {
    pool: Arc<ConnectionPool>,
    rooms: Arc<RoomRegistry>,
    config: RealtimeConfig,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(config: RealtimeConfig) -> Self {
        Self {
            pool: Arc::new(ConnectionPool::new()),
            rooms: Arc::new(RoomRegistry::new()),
            config,
        }
    }

    /// Registers a new connection.
    ///
    /// Returns the connection handle and a receiver for outbound frames.
    /// When an identified user is at the connection cap, their oldest
    /// connection is closed first.
    pub fn register(
        &self,
        identity: Option<Identity>,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size.max(1));
        let handle = Arc::new(ConnectionHandle::new(identity, tx));

        if let Some(user_id) = handle.user_id() {
            let existing = self.pool.get_user_connections(&user_id);
            let max = self.config.max_connections_per_user.max(1);
            if existing.len() >= max {
                warn!(
                    user_id = %user_id,
                    count = existing.len(),
                    max = max,
                    "User at max connections, closing oldest"
                );
                for oldest in existing.iter().take(existing.len() + 1 - max) {
                    self.unregister(&oldest.id);
                }
            }
        }

        self.pool.add(handle.clone());

        info!(
            conn_id = %handle.id,
            user_id = ?handle.user_id(),
            "Connection registered"
        );

        (handle, rx)
    }

    /// Closes a connection and removes it from every room.
    pub fn unregister(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.pool.remove(conn_id) {
            handle.close();
            let rooms = self.rooms.leave_all(*conn_id);
            info!(
                conn_id = %conn_id,
                user_id = ?handle.user_id(),
                rooms = rooms.len(),
                "Connection unregistered"
            );
        }
    }

    /// Joins a connection to a room.
    ///
    /// Returns `Ok(false)` if it was already joined.
    pub fn join(&self, conn_id: &ConnectionId, key: RoomKey) -> Result<bool, AppError> {
        let Some(handle) = self.pool.get(conn_id) else {
            return Err(AppError::not_found("Unknown connection"));
        };

        if let RoomKey::User(user_id) = key {
            if handle.user_id() != Some(user_id) {
                return Err(AppError::forbidden(
                    "A connection may only join its own user room",
                ));
            }
        }

        if self.rooms.is_member(&key, *conn_id) {
            return Ok(false);
        }
        if self.rooms.membership_count(*conn_id) >= self.config.max_rooms_per_connection {
            return Err(AppError::validation(format!(
                "Maximum rooms ({}) reached",
                self.config.max_rooms_per_connection
            )));
        }

        self.commit_join(conn_id, key)
    }

    /// Adds the membership, then backs it out if the connection was
    /// unregistered in the meantime. `unregister` removes from the pool
    /// before clearing rooms, so a membership added after that sweep is
    /// always caught here.
    fn commit_join(&self, conn_id: &ConnectionId, key: RoomKey) -> Result<bool, AppError> {
        let joined = self.rooms.join(key, *conn_id);
        if self.pool.get(conn_id).is_none() {
            self.rooms.leave(&key, *conn_id);
            debug!(conn_id = %conn_id, room = %key, "Connection closed during join");
            return Err(AppError::not_found("Unknown connection"));
        }
        debug!(conn_id = %conn_id, room = %key, "Joined room");
        Ok(joined)
    }

    /// Removes a connection from a room. Returns `false` if it was not joined.
    pub fn leave(&self, conn_id: &ConnectionId, key: &RoomKey) -> bool {
        let left = self.rooms.leave(key, *conn_id);
        if left {
            debug!(conn_id = %conn_id, room = %key, "Left room");
        }
        left
    }

    /// Processes an inbound frame from a client.
    pub async fn handle_inbound(&self, conn_id: &ConnectionId, raw: &str) {
        let Some(handle) = self.pool.get(conn_id) else {
            warn!(conn_id = %conn_id, "Message from unknown connection");
            return;
        };

        if let Err(e) = validate_inbound(raw) {
            self.reject(&handle, "INVALID_MESSAGE", e.message);
            return;
        }

        let event: ClientEvent = match serde_json::from_str(raw) {
            Ok(event) => event,
            Err(e) => {
                self.reject(
                    &handle,
                    "INVALID_MESSAGE",
                    format!("Failed to parse message: {e}"),
                );
                return;
            }
        };

        match event {
            ClientEvent::JoinRoom(user_id) => self.join_or_reject(&handle, RoomKey::User(user_id)),
            ClientEvent::JoinNotice(notice_id) => {
                self.join_or_reject(&handle, RoomKey::Notice(notice_id))
            }
            ClientEvent::LeaveRoom(user_id) => {
                self.leave(conn_id, &RoomKey::User(user_id));
            }
            ClientEvent::LeaveNotice(notice_id) => {
                self.leave(conn_id, &RoomKey::Notice(notice_id));
            }
            ClientEvent::CommentAdded {
                notice_id,
                comment,
                correlation_id,
            } => {
                if comment.notice_id != notice_id {
                    self.reject(&handle, "INVALID_MESSAGE", "Comment belongs to another notice");
                    return;
                }
                if handle.user_id() != Some(comment.author.id) {
                    self.reject(&handle, "FORBIDDEN", "Cannot relay another user's comment");
                    return;
                }
                self.relay(
                    &handle,
                    CommentUpdate::Add {
                        notice_id,
                        comment,
                        correlation_id,
                    },
                );
            }
            ClientEvent::CommentEdited {
                notice_id,
                comment_id,
                content,
            } => {
                if let Err(e) = validate_comment_content(&content) {
                    self.reject(&handle, "INVALID_MESSAGE", e.message);
                    return;
                }
                self.relay(
                    &handle,
                    CommentUpdate::Edit {
                        notice_id,
                        comment_id,
                        content,
                    },
                );
            }
            ClientEvent::CommentDeleted {
                notice_id,
                comment_id,
            } => {
                self.relay(
                    &handle,
                    CommentUpdate::Delete {
                        notice_id,
                        comment_id,
                    },
                );
            }
            ClientEvent::Pong => handle.record_pong().await,
        }
    }

    fn join_or_reject(&self, handle: &ConnectionHandle, key: RoomKey) {
        if let Err(e) = self.join(&handle.id, key) {
            let code = match e.kind {
                ErrorKind::Forbidden => "FORBIDDEN",
                ErrorKind::Validation => "ROOM_LIMIT",
                _ => "INVALID_MESSAGE",
            };
            self.reject(handle, code, e.message);
        }
    }

    /// Forwards a client-side comment change to every viewer of the notice,
    /// the sender included so it can settle its pending writes. The sender
    /// must be identified and viewing the notice.
    fn relay(&self, handle: &ConnectionHandle, update: CommentUpdate) {
        let room = RoomKey::Notice(update.notice_id());
        if handle.identity.is_none() {
            self.reject(handle, "UNAUTHORIZED", "Sign in to relay comment changes");
            return;
        }
        if !self.rooms.is_member(&room, handle.id) {
            self.reject(handle, "NOT_JOINED", format!("Join {room} before relaying to it"));
            return;
        }
        let delivered = self.send_to_room(&room, &ServerEvent::CommentUpdate(update));
        debug!(conn_id = %handle.id, room = %room, delivered, "Relayed comment update");
    }

    fn reject(&self, handle: &ConnectionHandle, code: &str, message: impl Into<String>) {
        let message = message.into();
        debug!(conn_id = %handle.id, code, message = %message, "Rejected client frame");
        if let Some(frame) = serialize(&ServerEvent::error(code, message)) {
            handle.send(frame);
        }
    }

    /// Delivers an event to every connected session. Returns how many
    /// connections accepted it.
    pub fn broadcast(&self, event: &ServerEvent) -> usize {
        let Some(frame) = serialize(event) else {
            return 0;
        };
        self.pool
            .all_connections()
            .iter()
            .filter(|conn| conn.send(frame.clone()))
            .count()
    }

    /// Delivers an event to the members of a room. With no members the
    /// event is dropped.
    pub fn send_to_room(&self, key: &RoomKey, event: &ServerEvent) -> usize {
        let members = self.rooms.members(key);
        if members.is_empty() {
            debug!(room = %key, event = event.name(), "No members, dropping event");
            return 0;
        }
        let Some(frame) = serialize(event) else {
            return 0;
        };

        let mut sent = 0;
        for conn_id in members {
            if let Some(handle) = self.pool.get(&conn_id) {
                if handle.send(frame.clone()) {
                    sent += 1;
                }
            }
        }
        sent
    }

    /// Closes all connections.
    pub fn close_all(&self) {
        let all = self.pool.all_connections();
        for conn in &all {
            self.unregister(&conn.id);
        }
        info!(count = all.len(), "All connections closed");
    }

    /// Returns the connection handle for an ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.pool.get(conn_id)
    }

    /// Returns the rooms a connection is joined to.
    pub fn rooms_of(&self, conn_id: &ConnectionId) -> Vec<RoomKey> {
        self.rooms.rooms_of(*conn_id)
    }

    /// Returns the total connection count.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Returns the number of unique connected users.
    pub fn user_count(&self) -> usize {
        self.pool.user_count()
    }

    /// Returns the number of rooms with members.
    pub fn room_count(&self) -> usize {
        self.rooms.room_count()
    }

}

fn serialize(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(frame) => Some(frame),
        Err(e) => {
            error!(error = %e, event = event.name(), "Failed to serialize outbound event");
            None
        }
    }
}
