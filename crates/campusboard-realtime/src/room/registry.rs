//! Room registry: which connections are joined to which rooms.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::connection::handle::ConnectionId;

use super::key::RoomKey;

#[derive(Debug, Default)]
struct RoomTable {
    /// Room -> joined connections.
    members: HashMap<RoomKey, HashSet<ConnectionId>>,
    /// Connection -> joined rooms (reverse index).
    joined: HashMap<ConnectionId, HashSet<RoomKey>>,
}

/// Membership table shared by every connection flow.
///
/// Both directions sit behind one lock so that removing a connection from
/// all of its rooms is a single step, and readers always copy members out
/// before delivering.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    table: RwLock<RoomTable>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, RoomTable> {
        self.table.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, RoomTable> {
        self.table.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Joins a connection to a room. Returns `false` if already joined.
    pub fn join(&self, key: RoomKey, conn_id: ConnectionId) -> bool {
        let mut table = self.write();
        let added = table.members.entry(key).or_default().insert(conn_id);
        table.joined.entry(conn_id).or_default().insert(key);
        added
    }

    /// Removes a connection from a room. Returns `false` if it was not joined.
    pub fn leave(&self, key: &RoomKey, conn_id: ConnectionId) -> bool {
        let mut table = self.write();
        let removed = match table.members.get_mut(key) {
            Some(members) => {
                let removed = members.remove(&conn_id);
                if members.is_empty() {
                    table.members.remove(key);
                }
                removed
            }
            None => false,
        };
        if let Some(rooms) = table.joined.get_mut(&conn_id) {
            rooms.remove(key);
            if rooms.is_empty() {
                table.joined.remove(&conn_id);
            }
        }
        removed
    }

    /// Removes a connection from every room it joined, returning those rooms.
    pub fn leave_all(&self, conn_id: ConnectionId) -> Vec<RoomKey> {
        let mut table = self.write();
        let rooms = table.joined.remove(&conn_id).unwrap_or_default();
        for key in &rooms {
            if let Some(members) = table.members.get_mut(key) {
                members.remove(&conn_id);
                if members.is_empty() {
                    table.members.remove(key);
                }
            }
        }
        rooms.into_iter().collect()
    }

    /// Snapshot of the connections currently joined to a room.
    pub fn members(&self, key: &RoomKey) -> Vec<ConnectionId> {
        self.read()
            .members
            .get(key)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether a connection is joined to a room.
    pub fn is_member(&self, key: &RoomKey, conn_id: ConnectionId) -> bool {
        self.read()
            .members
            .get(key)
            .is_some_and(|members| members.contains(&conn_id))
    }

    /// Rooms a connection is joined to.
    pub fn rooms_of(&self, conn_id: ConnectionId) -> Vec<RoomKey> {
        self.read()
            .joined
            .get(&conn_id)
            .map(|rooms| rooms.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of rooms a connection is joined to.
    pub fn membership_count(&self, conn_id: ConnectionId) -> usize {
        self.read().joined.get(&conn_id).map_or(0, HashSet::len)
    }

    /// Number of rooms with at least one member.
    pub fn room_count(&self) -> usize {
        self.read().members.len()
    }
}
