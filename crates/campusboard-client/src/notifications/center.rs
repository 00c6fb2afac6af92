//! Async owner of the notification view.
//!
//! [`NotificationCenter`] holds one live connection per signed-in
//! identity, joins the personal room and feeds `new-notice` and
//! `new-comment` pushes into the view. REST snapshots are merged through
//! the same view so that arrival order does not matter.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use campusboard_entity::Identity;
use campusboard_realtime::{ClientEvent, ServerEvent};

use super::view::{ItemKey, LoadState, NotificationItem, NotificationView};
use crate::api::{BoardApi, bounded};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::live::{self, Connector, LiveEvents, LiveHandle};
use crate::liveness::{Liveness, LivenessGuard};

/// Credentials of the signed-in user.
#[derive(Debug, Clone)]
pub struct Session {
    /// Bearer token for REST and the live handshake.
    pub token: String,
    /// Who the token belongs to.
    pub identity: Identity,
}

struct Inner {
    api: Arc<dyn BoardApi>,
    connector: Arc<dyn Connector>,
    config: ClientConfig,
    view: Mutex<NotificationView>,
    session: Mutex<Option<Session>>,
    connection: Mutex<Option<LiveHandle>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    liveness: Liveness,
    next_local: AtomicU64,
}

/// The notification dropdown's state and its transports.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl NotificationCenter {
    /// Creates an idle store. Nothing is fetched until [`start`](Self::start).
    pub fn new(
        api: Arc<dyn BoardApi>,
        connector: Arc<dyn Connector>,
        config: ClientConfig,
    ) -> Self {
        let view = NotificationView::new(config.window);
        Self {
            inner: Arc::new(Inner {
                api,
                connector,
                config,
                view: Mutex::new(view),
                session: Mutex::new(None),
                connection: Mutex::new(None),
                listener: Mutex::new(None),
                liveness: Liveness::new(),
                next_local: AtomicU64::new(1),
            }),
        }
    }

    /// Starts (or restarts) the store for an identity.
    ///
    /// Any previous connection is closed first. Signed-out sessions get
    /// no connection and show the public feed.
    pub async fn start(&self, session: Option<Session>) {
        self.teardown().await;
        *self.inner.session.lock().await = session.clone();

        if let Some(session) = session {
            self.connect(&session).await;
        }
        self.refresh().await;
    }

    async fn connect(&self, session: &Session) {
        let guard = self.inner.liveness.guard();
        let events = match self.open(session, &guard).await {
            Ok(events) => {
                debug!(user_id = %session.identity.user_id, "Notification store connected");
                Some(events)
            }
            Err(e) => {
                warn!(error = %e, "Notification connection failed");
                None
            }
        };
        if guard.is_live() {
            let listener = tokio::spawn(listen(self.clone(), events, guard));
            *self.inner.listener.lock().await = Some(listener);
        }
    }

    /// Opens a connection and joins the personal room.
    async fn open(&self, session: &Session, guard: &LivenessGuard) -> ClientResult<LiveEvents> {
        let connection = self.inner.connector.connect(Some(&session.token)).await?;
        let (handle, events) = connection.split();

        let user_id = session.identity.user_id;
        if let Err(e) = handle.send(ClientEvent::JoinRoom(user_id)).await {
            warn!(error = %e, "Failed to join personal room");
        }

        let mut slot = self.inner.connection.lock().await;
        if !guard.is_live() {
            handle.close();
            return Err(ClientError::Transport("store was torn down".into()));
        }
        *slot = Some(handle);
        Ok(events)
    }

    /// Reopens a dropped connection and catches up on what was missed.
    async fn reconnect(&self, guard: &LivenessGuard) -> Option<LiveEvents> {
        let session = self.session().await?;
        let session = &session;
        let events =
            live::reconnect(&self.inner.config, guard, move || self.open(session, guard)).await?;
        self.refresh().await;
        Some(events)
    }

    /// Stops all live work and clears the view. Safe to call repeatedly.
    pub async fn teardown(&self) {
        self.inner.liveness.invalidate();

        if let Some(handle) = self.inner.connection.lock().await.take() {
            if handle.close() {
                debug!("Notification connection closed");
            }
        }
        if let Some(listener) = self.inner.listener.lock().await.take() {
            listener.abort();
        }

        self.inner.view.lock().await.reset();
        *self.inner.session.lock().await = None;
    }

    /// Reloads from the server.
    ///
    /// Signed-in sessions read their records. Without credentials, or if
    /// the server rejects them, the public feed is shown as unread items.
    /// Any other failure yields an empty list.
    pub async fn refresh(&self) {
        let guard = self.inner.liveness.guard();
        self.inner.view.lock().await.begin_load();

        let session = self.session().await;
        let (items, unread) = self.load(session.as_ref()).await;

        let mut view = self.inner.view.lock().await;
        if !guard.is_live() {
            trace!("Dropping stale notification snapshot");
            return;
        }
        view.apply_snapshot(items, unread);
    }

    async fn load(&self, session: Option<&Session>) -> (Vec<NotificationItem>, u64) {
        let timeout = self.inner.config.request_timeout();

        let department = match session {
            Some(session) => {
                let limit = self.inner.config.window as u64;
                let call = self.inner.api.notifications(&session.token, limit);
                match bounded(timeout, call).await {
                    Ok(page) => {
                        let items = page.items.iter().map(NotificationItem::from_record).collect();
                        return (items, page.unread_count);
                    }
                    Err(ClientError::Status { status, .. }) => {
                        debug!(status, "Notifications rejected, showing public feed");
                        session.identity.department.clone()
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to load notifications");
                        return (Vec::new(), 0);
                    }
                }
            }
            None => None,
        };

        let department = department.unwrap_or_else(|| self.inner.config.public_department.clone());
        let call = self
            .inner
            .api
            .public_notices(&department, self.inner.config.public_feed_limit);
        match bounded(timeout, call).await {
            Ok(notices) => {
                let items: Vec<NotificationItem> =
                    notices.iter().map(NotificationItem::from_public_notice).collect();
                let unread = items.len() as u64;
                (items, unread)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load public notices");
                (Vec::new(), 0)
            }
        }
    }

    /// Prepends an item. Returns `false` for a duplicate key.
    pub async fn add_notification(&self, item: NotificationItem) -> bool {
        self.inner.view.lock().await.add(item)
    }

    /// Applies a live event. Returns `true` if the view changed.
    pub async fn handle_event(&self, event: &ServerEvent) -> bool {
        match self.item_for(event) {
            Some(item) => self.add_notification(item).await,
            None => false,
        }
    }

    async fn handle_if_live(&self, event: &ServerEvent, guard: &LivenessGuard) -> bool {
        let Some(item) = self.item_for(event) else {
            return false;
        };
        let mut view = self.inner.view.lock().await;
        guard.is_live() && view.add(item)
    }

    fn item_for(&self, event: &ServerEvent) -> Option<NotificationItem> {
        match event {
            ServerEvent::NewNotice { notice, message } => {
                Some(NotificationItem::from_new_notice(notice, message))
            }
            ServerEvent::NewComment(Some(payload)) => {
                let local = self.inner.next_local.fetch_add(1, Ordering::Relaxed);
                Some(NotificationItem::from_new_comment(payload, local))
            }
            _ => None,
        }
    }

    /// Marks one item read, persists it, then reloads.
    pub async fn mark_as_read(&self, key: ItemKey) {
        let guard = self.inner.liveness.guard();
        self.inner.view.lock().await.mark_read(&key);

        let ItemKey::Record(id) = key else { return };
        let Some(session) = self.session().await else { return };

        let call = self.inner.api.mark_read(&session.token, id);
        match bounded(self.inner.config.request_timeout(), call).await {
            Ok(()) if guard.is_live() => self.refresh().await,
            Ok(()) => {}
            Err(e) => warn!(error = %e, notification_id = %id, "Mark as read failed"),
        }
    }

    /// Marks everything read, persists it, then reloads.
    pub async fn mark_all_as_read(&self) {
        let guard = self.inner.liveness.guard();
        self.inner.view.lock().await.mark_all_read();

        let Some(session) = self.session().await else { return };

        let call = self.inner.api.mark_all_read(&session.token);
        match bounded(self.inner.config.request_timeout(), call).await {
            Ok(()) if guard.is_live() => self.refresh().await,
            Ok(()) => {}
            Err(e) => warn!(error = %e, "Mark all read failed"),
        }
    }

    /// Removes one item and deletes its record.
    pub async fn delete_notification(&self, key: ItemKey) {
        self.inner.view.lock().await.remove(&key);

        let ItemKey::Record(id) = key else { return };
        let Some(session) = self.session().await else { return };

        let call = self.inner.api.delete_notification(&session.token, id);
        if let Err(e) = bounded(self.inner.config.request_timeout(), call).await {
            warn!(error = %e, notification_id = %id, "Delete notification failed");
        }
    }

    /// Shown items, newest first.
    pub async fn items(&self) -> Vec<NotificationItem> {
        self.inner.view.lock().await.items().to_vec()
    }

    pub async fn unread_count(&self) -> u64 {
        self.inner.view.lock().await.unread_count()
    }

    /// See [`NotificationView::state`].
    pub async fn state(&self) -> LoadState {
        self.inner.view.lock().await.state()
    }

    /// Whether a live connection is open.
    pub async fn is_connected(&self) -> bool {
        self.inner
            .connection
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_closed())
    }

    async fn session(&self) -> Option<Session> {
        self.inner.session.lock().await.clone()
    }
}

async fn listen(
    center: NotificationCenter,
    mut events: Option<LiveEvents>,
    guard: LivenessGuard,
) {
    loop {
        if let Some(mut current) = events.take() {
            while let Some(event) = current.next().await {
                if !guard.is_live() {
                    break;
                }
                if center.handle_if_live(&event, &guard).await {
                    trace!(event = event.name(), "Notification added from live event");
                }
            }
        }
        if !guard.is_live() {
            break;
        }
        debug!("Notification connection lost");
        events = center.reconnect(&guard).await;
        if events.is_none() {
            break;
        }
    }
    trace!("Notification listener stopped");
}
