//! Order-independent notification list state.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use campusboard_core::types::id::{NoticeId, NotificationId};
use campusboard_entity::Notice;
use campusboard_realtime::message::types::NewCommentPayload;

use crate::api::RemoteNotification;

/// Identity of an item in the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum ItemKey {
    /// A persisted notification record.
    Record(NotificationId),
    /// A notice shown from the public feed or a `new-notice` push.
    Notice(NoticeId),
    /// A pushed item with no persisted record.
    Local(u64),
}

/// One row of the notification dropdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationItem {
    /// Dedup key; see [`ItemKey`].
    pub key: ItemKey,
    /// Related notice title, or the record's own title when the notice is gone.
    pub title: String,
    pub message: String,
    /// Counted in the unread badge while `false`.
    pub is_read: bool,
    /// Sort key; the list is newest first.
    pub created_at: DateTime<Utc>,
    /// Notice to open when the row is clicked.
    pub notice_id: Option<NoticeId>,
}

impl NotificationItem {
    /// Item for a stored record.
    pub fn from_record(remote: &RemoteNotification) -> Self {
        let record = &remote.notification;
        let title = remote
            .related_notice
            .as_ref()
            .map(|n| n.title.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| record.title.clone());
        Self {
            key: ItemKey::Record(record.id),
            title,
            message: record.message.clone(),
            is_read: record.is_read,
            created_at: record.created_at,
            notice_id: record.notice_id,
        }
    }

    /// Unread item for a notice from the public feed.
    pub fn from_public_notice(notice: &Notice) -> Self {
        Self {
            key: ItemKey::Notice(notice.id),
            title: notice.title.clone(),
            message: format!("New notice: {}", notice.title),
            is_read: false,
            created_at: notice.created_at,
            notice_id: Some(notice.id),
        }
    }

    /// Item for a `new-notice` push.
    pub fn from_new_notice(notice: &Notice, message: &str) -> Self {
        let title = if notice.title.is_empty() {
            "New Notice".to_string()
        } else {
            notice.title.clone()
        };
        Self {
            key: ItemKey::Notice(notice.id),
            title,
            message: message.to_string(),
            is_read: false,
            created_at: notice.created_at,
            notice_id: Some(notice.id),
        }
    }

    /// Item for a targeted `new-comment` push. `local` keys it when the
    /// server did not persist a record.
    pub fn from_new_comment(payload: &NewCommentPayload, local: u64) -> Self {
        let key = payload
            .notification_id
            .map_or(ItemKey::Local(local), ItemKey::Record);
        Self {
            key,
            title: "New Comment".to_string(),
            message: payload.message.clone(),
            is_read: false,
            created_at: payload.comment.created_at,
            notice_id: Some(payload.notice.id),
        }
    }
}

/// Load state of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    /// Nothing fetched since start or teardown.
    #[default]
    Uninitialized,
    /// At least one snapshot is in flight.
    Loading,
    Ready,
}

/// Newest-first bounded list with an independent unread counter.
///
/// Snapshots and pushes commute: an item that arrives by push while a
/// snapshot is in flight survives the snapshot, and an item present in
/// both is kept once. A key is counted at most once per session, even
/// after it has scrolled out of the window.
#[derive(Debug, Clone)]
pub struct NotificationView {
    items: Vec<NotificationItem>,
    unread: u64,
    state: LoadState,
    window: usize,
    loads: usize,
    arrived_during_load: HashSet<ItemKey>,
    seen: HashSet<ItemKey>,
}

impl NotificationView {
    /// An empty view that shows at most `window` items.
    pub fn new(window: usize) -> Self {
        Self {
            items: Vec::new(),
            unread: 0,
            state: LoadState::Uninitialized,
            window: window.max(1),
            loads: 0,
            arrived_during_load: HashSet::new(),
            seen: HashSet::new(),
        }
    }

    /// Shown items, newest first.
    pub fn items(&self) -> &[NotificationItem] {
        &self.items
    }

    /// Independent of the window; may exceed the number of shown items.
    pub fn unread_count(&self) -> u64 {
        self.unread
    }

    /// Ready once every started load has landed.
    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn contains(&self, key: &ItemKey) -> bool {
        self.items.iter().any(|i| &i.key == key)
    }

    /// Marks a snapshot as in flight. Loads may overlap.
    pub fn begin_load(&mut self) {
        if self.loads == 0 {
            self.arrived_during_load.clear();
        }
        self.loads += 1;
        self.state = LoadState::Loading;
    }

    /// Prepends an item. Returns `false` if the key was already seen.
    pub fn add(&mut self, item: NotificationItem) -> bool {
        if !self.seen.insert(item.key) {
            return false;
        }
        if self.state == LoadState::Loading {
            self.arrived_during_load.insert(item.key);
        }
        if !item.is_read {
            self.unread += 1;
        }
        self.items.insert(0, item);
        self.items.truncate(self.window);
        true
    }

    /// Replaces the list with a snapshot, keeping items pushed while
    /// it was loading. The arrival set is kept until the last overlapping
    /// load has landed.
    pub fn apply_snapshot(&mut self, snapshot: Vec<NotificationItem>, unread_count: u64) {
        self.loads = self.loads.saturating_sub(1);
        let mut kept: HashSet<ItemKey> = HashSet::with_capacity(snapshot.len());
        let mut merged: Vec<NotificationItem> = Vec::with_capacity(snapshot.len());
        for item in snapshot {
            if kept.insert(item.key) {
                merged.push(item);
            }
        }

        let mut unread = unread_count;
        for item in self.items.drain(..) {
            if self.arrived_during_load.contains(&item.key) && !kept.contains(&item.key) {
                if !item.is_read {
                    unread += 1;
                }
                kept.insert(item.key);
                merged.push(item);
            }
        }

        merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        merged.truncate(self.window);

        self.seen.extend(kept);
        self.items = merged;
        self.unread = unread;
        if self.loads == 0 {
            self.arrived_during_load.clear();
            self.state = LoadState::Ready;
        }
    }

    /// Flips one item to read. Returns `true` if it was unread.
    pub fn mark_read(&mut self, key: &ItemKey) -> bool {
        let Some(item) = self.items.iter_mut().find(|i| &i.key == key) else {
            return false;
        };
        if item.is_read {
            return false;
        }
        item.is_read = true;
        self.unread = self.unread.saturating_sub(1);
        true
    }

    /// Flips every shown item to read and zeroes the counter.
    pub fn mark_all_read(&mut self) {
        for item in &mut self.items {
            item.is_read = true;
        }
        self.unread = 0;
    }

    /// Removes one item, adjusting the counter if it was unread.
    pub fn remove(&mut self, key: &ItemKey) -> Option<NotificationItem> {
        let index = self.items.iter().position(|i| &i.key == key)?;
        let item = self.items.remove(index);
        if !item.is_read {
            self.unread = self.unread.saturating_sub(1);
        }
        Some(item)
    }

    /// Back to the initial empty state.
    pub fn reset(&mut self) {
        self.items.clear();
        self.unread = 0;
        self.state = LoadState::Uninitialized;
        self.loads = 0;
        self.arrived_during_load.clear();
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn item(key: ItemKey, minutes_ago: i64) -> NotificationItem {
        NotificationItem {
            key,
            title: "New Comment".into(),
            message: format!("item {minutes_ago}"),
            is_read: false,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
            notice_id: None,
        }
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut view = NotificationView::new(10);
        let key = ItemKey::Record(NotificationId::new());
        assert!(view.add(item(key, 0)));
        assert!(!view.add(item(key, 0)));
        assert_eq!(view.items().len(), 1);
        assert_eq!(view.unread_count(), 1);
    }

    #[test]
    fn test_window_keeps_newest_ten() {
        let mut view = NotificationView::new(10);
        for n in 0..15u64 {
            view.add(item(ItemKey::Local(n), 15 - n as i64));
        }
        assert_eq!(view.items().len(), 10);
        assert_eq!(view.items()[0].key, ItemKey::Local(14));
        assert_eq!(view.items()[9].key, ItemKey::Local(5));
        assert_eq!(view.unread_count(), 15);
    }

    #[test]
    fn test_snapshot_and_push_commute() {
        let pushed = item(ItemKey::Record(NotificationId::new()), 0);
        let older = item(ItemKey::Record(NotificationId::new()), 5);
        let snapshot = vec![pushed.clone(), older.clone()];

        let mut push_first = NotificationView::new(10);
        push_first.begin_load();
        push_first.add(pushed.clone());
        push_first.apply_snapshot(snapshot.clone(), 2);

        let mut snapshot_first = NotificationView::new(10);
        snapshot_first.begin_load();
        snapshot_first.apply_snapshot(snapshot, 2);
        snapshot_first.add(pushed);

        assert_eq!(push_first.items(), snapshot_first.items());
        assert_eq!(push_first.unread_count(), 2);
        assert_eq!(snapshot_first.unread_count(), 2);
        assert_eq!(push_first.state(), LoadState::Ready);
    }

    #[test]
    fn test_push_during_load_survives_older_snapshot() {
        let mut view = NotificationView::new(10);
        view.begin_load();
        let fresh = item(ItemKey::Local(1), 0);
        view.add(fresh.clone());

        let stored = item(ItemKey::Record(NotificationId::new()), 3);
        view.apply_snapshot(vec![stored], 1);

        assert_eq!(view.items().len(), 2);
        assert_eq!(view.items()[0], fresh);
        assert_eq!(view.unread_count(), 2);
    }

    #[test]
    fn test_unread_never_negative() {
        let mut view = NotificationView::new(10);
        let key = ItemKey::Local(1);
        view.add(item(key, 0));
        assert!(view.mark_read(&key));
        assert!(!view.mark_read(&key));
        assert!(!view.mark_read(&ItemKey::Local(99)));
        assert_eq!(view.unread_count(), 0);

        view.remove(&key);
        assert_eq!(view.unread_count(), 0);
    }

    #[test]
    fn test_mark_all_read() {
        let mut view = NotificationView::new(10);
        view.begin_load();
        view.apply_snapshot(
            vec![
                item(ItemKey::Local(1), 1),
                item(ItemKey::Local(2), 2),
            ],
            7,
        );
        view.mark_all_read();
        assert_eq!(view.unread_count(), 0);
        assert!(view.items().iter().all(|i| i.is_read));
    }

    #[test]
    fn test_remove_decrements_only_unread() {
        let mut view = NotificationView::new(10);
        view.add(item(ItemKey::Local(1), 1));
        view.add(item(ItemKey::Local(2), 0));
        view.mark_read(&ItemKey::Local(2));
        assert_eq!(view.unread_count(), 1);

        assert!(view.remove(&ItemKey::Local(2)).is_some());
        assert_eq!(view.unread_count(), 1);
        assert!(view.remove(&ItemKey::Local(1)).is_some());
        assert_eq!(view.unread_count(), 0);
        assert!(view.remove(&ItemKey::Local(1)).is_none());
    }

    #[test]
    fn test_overlapping_loads_keep_pushed_items() {
        let mut view = NotificationView::new(10);
        view.begin_load();
        view.add(item(ItemKey::Local(1), 0));
        view.begin_load();

        view.apply_snapshot(vec![], 0);
        assert_eq!(view.state(), LoadState::Loading);
        view.apply_snapshot(vec![], 0);

        assert_eq!(view.state(), LoadState::Ready);
        assert_eq!(view.items().len(), 1);
        assert_eq!(view.unread_count(), 1);
    }

    #[test]
    fn test_redelivery_after_eviction_is_not_counted() {
        let mut view = NotificationView::new(10);
        for n in 0..11u64 {
            assert!(view.add(item(ItemKey::Local(n), 11 - n as i64)));
        }
        assert!(!view.contains(&ItemKey::Local(0)));

        assert!(!view.add(item(ItemKey::Local(0), 11)));
        assert_eq!(view.unread_count(), 11);
        assert_eq!(view.items().len(), 10);
    }

    #[test]
    fn test_snapshot_keys_are_not_counted_again() {
        let mut view = NotificationView::new(1);
        let stored = ItemKey::Record(NotificationId::new());
        let older = ItemKey::Record(NotificationId::new());
        view.begin_load();
        view.apply_snapshot(vec![item(stored, 0), item(older, 5)], 2);
        assert!(!view.contains(&older));

        assert!(!view.add(item(older, 5)));
        assert_eq!(view.unread_count(), 2);

        view.reset();
        assert!(view.add(item(older, 5)));
    }

    fn permutations(n: usize) -> Vec<Vec<usize>> {
        if n == 0 {
            return vec![Vec::new()];
        }
        let mut out = Vec::new();
        for rest in permutations(n - 1) {
            for slot in 0..=rest.len() {
                let mut order = rest.clone();
                order.insert(slot, n - 1);
                out.push(order);
            }
        }
        out
    }

    #[test]
    fn test_every_interleaving_converges() {
        let record = ItemKey::Record(NotificationId::new());
        let notice = ItemKey::Notice(NoticeId::new());
        let local = ItemKey::Local(7);
        let pushes = [
            item(record, 1),
            item(local, 0),
            item(record, 1),
            item(notice, 2),
            item(record, 1),
        ];
        let snapshot = vec![item(record, 1), item(ItemKey::Record(NotificationId::new()), 9)];
        let expected: HashSet<ItemKey> = [local, record, notice, snapshot[1].key].into();

        for order in permutations(pushes.len()) {
            for snapshot_at in 0..=order.len() {
                let mut view = NotificationView::new(10);
                view.begin_load();
                for (position, index) in order.iter().enumerate() {
                    if position == snapshot_at {
                        view.apply_snapshot(snapshot.clone(), 2);
                    }
                    view.add(pushes[*index].clone());
                }
                if snapshot_at == order.len() {
                    view.apply_snapshot(snapshot.clone(), 2);
                }

                let keys: HashSet<ItemKey> = view.items().iter().map(|i| i.key).collect();
                assert_eq!(view.items().len(), 4);
                assert_eq!(keys, expected, "order {order:?}, snapshot at {snapshot_at}");
                assert_eq!(view.unread_count(), 4, "order {order:?}, snapshot at {snapshot_at}");
                assert_eq!(view.state(), LoadState::Ready);
            }
        }
    }
}
