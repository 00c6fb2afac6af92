//! Async owner of one notice's comment view.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use campusboard_core::types::id::{CommentId, CorrelationId, NoticeId};
use campusboard_entity::Comment;
use campusboard_realtime::ClientEvent;

use super::view::{CommentState, CommentView};
use crate::api::{BoardApi, bounded};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::live::{self, Connector, LiveEvents, LiveHandle};
use crate::liveness::{Liveness, LivenessGuard};
use crate::notifications::Session;

struct Inner {
    notice_id: NoticeId,
    api: Arc<dyn BoardApi>,
    connector: Arc<dyn Connector>,
    config: ClientConfig,
    session: Option<Session>,
    view: Mutex<CommentView>,
    connection: Mutex<Option<LiveHandle>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    liveness: Liveness,
}

/// Comments of a notice while its detail view is visible.
///
/// [`open`](Self::open) joins the notice room and loads the thread;
/// [`close`](Self::close) leaves the room and closes the connection.
#[derive(Clone)]
pub struct CommentStream {
    inner: Arc<Inner>,
}

impl CommentStream {
    /// Creates a closed stream for `notice_id`. `session` is needed only to write.
    pub fn new(
        notice_id: NoticeId,
        api: Arc<dyn BoardApi>,
        connector: Arc<dyn Connector>,
        config: ClientConfig,
        session: Option<Session>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                notice_id,
                api,
                connector,
                config,
                session,
                view: Mutex::new(CommentView::new(notice_id)),
                connection: Mutex::new(None),
                listener: Mutex::new(None),
                liveness: Liveness::new(),
            }),
        }
    }

    pub fn notice_id(&self) -> NoticeId {
        self.inner.notice_id
    }

    /// Joins the notice room and loads the thread.
    pub async fn open(&self) {
        let guard = self.inner.liveness.guard();
        self.inner.view.lock().await.begin_load();

        let events = match self.join(&guard).await {
            Ok(events) => Some(events),
            Err(e) => {
                warn!(error = %e, "Comment connection failed");
                None
            }
        };
        if guard.is_live() {
            let listener = tokio::spawn(listen(self.clone(), events, guard.clone()));
            *self.inner.listener.lock().await = Some(listener);
        }

        self.load(&guard).await;
    }

    /// Fetches the thread and applies it unless the stream was closed.
    async fn load(&self, guard: &LivenessGuard) {
        let call = self.inner.api.comments(self.inner.notice_id);
        let snapshot = match bounded(self.inner.config.request_timeout(), call).await {
            Ok(comments) => comments,
            Err(e) => {
                warn!(error = %e, notice_id = %self.inner.notice_id, "Failed to load comments");
                Vec::new()
            }
        };

        let mut view = self.inner.view.lock().await;
        if !guard.is_live() {
            trace!("Dropping stale comment snapshot");
            return;
        }
        view.apply_snapshot(snapshot);
    }

    /// Opens a connection and joins the notice room.
    async fn join(&self, guard: &LivenessGuard) -> ClientResult<LiveEvents> {
        let token = self.inner.session.as_ref().map(|s| s.token.as_str());
        let connection = self.inner.connector.connect(token).await?;
        let (handle, events) = connection.split();

        if let Err(e) = handle.send(ClientEvent::JoinNotice(self.inner.notice_id)).await {
            warn!(error = %e, "Failed to join notice room");
        }

        let mut slot = self.inner.connection.lock().await;
        if !guard.is_live() {
            handle.close();
            return Err(ClientError::Transport("stream was closed".into()));
        }
        *slot = Some(handle);
        Ok(events)
    }

    /// Rejoins after a dropped connection and reloads the thread.
    async fn reconnect(&self, guard: &LivenessGuard) -> Option<LiveEvents> {
        let events = live::reconnect(&self.inner.config, guard, move || self.join(guard)).await?;
        self.inner.view.lock().await.begin_load();
        self.load(guard).await;
        Some(events)
    }

    /// Posts a comment, or a reply when `parent` is given.
    pub async fn post(&self, content: &str, parent: Option<CommentId>) -> ClientResult<Comment> {
        let session = self.session()?;
        let guard = self.inner.liveness.guard();
        let call = self
            .inner
            .api
            .create_comment(&session.token, self.inner.notice_id, content, parent);
        let created = bounded(self.inner.config.request_timeout(), call).await?;

        let event = {
            let mut view = self.inner.view.lock().await;
            if !guard.is_live() {
                return Ok(created);
            }
            view.local_add(created.clone(), CorrelationId::new())
        };
        self.announce(event).await;
        Ok(created)
    }

    /// Saves an edit, applies it and tells the other viewers.
    pub async fn edit(&self, comment_id: CommentId, content: &str) -> ClientResult<Comment> {
        let session = self.session()?;
        let guard = self.inner.liveness.guard();
        let call = self.inner.api.edit_comment(&session.token, comment_id, content);
        let edited = bounded(self.inner.config.request_timeout(), call).await?;

        let event = {
            let mut view = self.inner.view.lock().await;
            if !guard.is_live() {
                return Ok(edited);
            }
            view.local_edit(comment_id, edited.content.clone())
        };
        self.announce(event).await;
        Ok(edited)
    }

    /// Deletes a comment, removes it and tells the other viewers.
    pub async fn delete(&self, comment_id: CommentId) -> ClientResult<Comment> {
        let session = self.session()?;
        let guard = self.inner.liveness.guard();
        let call = self.inner.api.delete_comment(&session.token, comment_id);
        let deleted = bounded(self.inner.config.request_timeout(), call).await?;

        let event = {
            let mut view = self.inner.view.lock().await;
            if !guard.is_live() {
                return Ok(deleted);
            }
            view.local_delete(comment_id)
        };
        self.announce(event).await;
        Ok(deleted)
    }

    /// Leaves the room and closes the connection. Later calls do nothing.
    pub async fn close(&self) {
        self.inner.liveness.invalidate();

        if let Some(handle) = self.inner.connection.lock().await.take() {
            if let Err(e) = handle.send(ClientEvent::LeaveNotice(self.inner.notice_id)).await {
                trace!(error = %e, "Leave notice not sent");
            }
            if handle.close() {
                debug!(notice_id = %self.inner.notice_id, "Comment connection closed");
            }
        }
        if let Some(listener) = self.inner.listener.lock().await.take() {
            listener.abort();
        }
        self.inner.view.lock().await.reset();
    }

    /// The thread, newest first.
    pub async fn comments(&self) -> Vec<Comment> {
        self.inner.view.lock().await.comments().to_vec()
    }

    /// Comments plus replies, for the host's counter.
    pub async fn comment_count(&self) -> usize {
        self.inner.view.lock().await.comment_count()
    }

    /// `Loading` until the first snapshot lands, `Idle` after close.
    pub async fn state(&self) -> CommentState {
        self.inner.view.lock().await.state()
    }

    async fn announce(&self, event: ClientEvent) {
        let handle = self.inner.connection.lock().await.clone();
        if let Some(handle) = handle {
            if let Err(e) = handle.send(event).await {
                warn!(error = %e, "Failed to relay comment change");
            }
        }
    }

    fn session(&self) -> ClientResult<&Session> {
        self.inner.session.as_ref().ok_or(ClientError::SignedOut)
    }
}

async fn listen(
    stream: CommentStream,
    mut events: Option<LiveEvents>,
    guard: LivenessGuard,
) {
    loop {
        if let Some(mut current) = events.take() {
            while let Some(event) = current.next().await {
                let mut view = stream.inner.view.lock().await;
                if !guard.is_live() {
                    break;
                }
                if view.apply_server_event(&event) {
                    trace!(event = event.name(), "Comment view updated");
                }
            }
        }
        if !guard.is_live() {
            break;
        }
        debug!(notice_id = %stream.inner.notice_id, "Comment connection lost");
        events = stream.reconnect(&guard).await;
        if events.is_none() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use tokio::sync::Notify;

    use campusboard_entity::{Identity, UserRole};
    use campusboard_realtime::{CommentUpdate, ServerEvent};

    use super::*;
    use crate::testing::{FakeApi, FakeConnector, comment, identity};

    fn session(identity: Identity) -> Session {
        Session {
            token: "token".into(),
            identity,
        }
    }

    fn stream(
        api: Arc<FakeApi>,
        connector: Arc<FakeConnector>,
        session: Option<Session>,
    ) -> CommentStream {
        CommentStream::new(NoticeId::new(), api, connector, ClientConfig::default(), session)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_open_joins_room_and_loads() {
        let api = Arc::new(FakeApi::default());
        let connector = Arc::new(FakeConnector::default());
        let stream = stream(api.clone(), connector.clone(), None);
        let author = identity("B", UserRole::Student).author();
        *api.comments.lock().await = vec![comment(stream.notice_id(), &author, "first")];

        stream.open().await;

        assert_eq!(stream.state().await, CommentState::Ready);
        assert_eq!(stream.comment_count().await, 1);
        let mut peers = connector.peers.lock().await;
        assert_eq!(
            peers[0].try_recv(),
            Some(ClientEvent::JoinNotice(stream.notice_id()))
        );
        assert!(connector.tokens.lock().await[0].is_none());
    }

    #[tokio::test]
    async fn test_failed_fetch_is_ready_and_empty() {
        let api = Arc::new(FakeApi::default());
        api.fail.store(true, Ordering::SeqCst);
        let stream = stream(api, Arc::new(FakeConnector::default()), None);

        stream.open().await;

        assert_eq!(stream.state().await, CommentState::Ready);
        assert_eq!(stream.comment_count().await, 0);
    }

    #[tokio::test]
    async fn test_post_applies_locally_and_relays() {
        let connector = Arc::new(FakeConnector::default());
        let stream = stream(
            Arc::new(FakeApi::default()),
            connector.clone(),
            Some(session(identity("B", UserRole::Student))),
        );
        stream.open().await;
        connector.peers.lock().await[0].try_recv();

        let created = stream.post("hi", None).await.unwrap();

        assert_eq!(stream.comment_count().await, 1);
        let relayed = connector.peers.lock().await[0].try_recv();
        assert!(matches!(
            relayed,
            Some(ClientEvent::CommentAdded { comment, correlation_id: Some(_), .. })
                if comment.id == created.id
        ));
    }

    #[tokio::test]
    async fn test_post_requires_session() {
        let stream = stream(
            Arc::new(FakeApi::default()),
            Arc::new(FakeConnector::default()),
            None,
        );
        stream.open().await;
        assert!(matches!(
            stream.post("hi", None).await,
            Err(ClientError::SignedOut)
        ));
        assert_eq!(stream.comment_count().await, 0);
    }

    #[tokio::test]
    async fn test_rejected_post_changes_nothing() {
        let api = Arc::new(FakeApi::default());
        let connector = Arc::new(FakeConnector::default());
        let stream = stream(
            api.clone(),
            connector.clone(),
            Some(session(identity("B", UserRole::Student))),
        );
        stream.open().await;
        connector.peers.lock().await[0].try_recv();

        api.fail.store(true, Ordering::SeqCst);
        assert!(stream.post("hi", None).await.is_err());
        assert_eq!(stream.comment_count().await, 0);
        assert!(connector.peers.lock().await[0].try_recv().is_none());
    }

    #[tokio::test]
    async fn test_remote_updates_from_other_tabs() {
        let connector = Arc::new(FakeConnector::default());
        let stream = stream(Arc::new(FakeApi::default()), connector.clone(), None);
        stream.open().await;

        let author = identity("B", UserRole::Student).author();
        let added = comment(stream.notice_id(), &author, "from another tab");
        let peers = connector.peers.lock().await;
        peers[0]
            .push(ServerEvent::CommentUpdate(CommentUpdate::Add {
                notice_id: stream.notice_id(),
                comment: added.clone(),
                correlation_id: None,
            }))
            .await;
        peers[0]
            .push(ServerEvent::CommentUpdate(CommentUpdate::Edit {
                notice_id: stream.notice_id(),
                comment_id: added.id,
                content: "edited elsewhere".into(),
            }))
            .await;
        drop(peers);
        settle().await;

        let comments = stream.comments().await;
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "edited elsewhere");
        assert!(comments[0].is_edited);
    }

    #[tokio::test]
    async fn test_close_leaves_room_once() {
        let connector = Arc::new(FakeConnector::default());
        let stream = stream(Arc::new(FakeApi::default()), connector.clone(), None);
        stream.open().await;

        stream.close().await;
        stream.close().await;

        let mut peers = connector.peers.lock().await;
        assert!(peers[0].is_closed());
        assert_eq!(
            peers[0].try_recv(),
            Some(ClientEvent::JoinNotice(stream.notice_id()))
        );
        assert_eq!(
            peers[0].try_recv(),
            Some(ClientEvent::LeaveNotice(stream.notice_id()))
        );
        assert!(peers[0].try_recv().is_none());
        drop(peers);
        assert_eq!(stream.state().await, CommentState::Idle);
    }

    #[tokio::test]
    async fn test_snapshot_after_close_is_dropped() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(FakeApi::gated(gate.clone()));
        let stream = stream(api.clone(), Arc::new(FakeConnector::default()), None);
        let author = identity("B", UserRole::Student).author();
        *api.comments.lock().await = vec![comment(stream.notice_id(), &author, "late")];

        let opening = tokio::spawn({
            let stream = stream.clone();
            async move { stream.open().await }
        });
        settle().await;
        stream.close().await;
        gate.notify_one();
        opening.await.unwrap();

        assert_eq!(stream.comment_count().await, 0);
        assert_eq!(stream.state().await, CommentState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_connection_rejoins_and_reloads() {
        let api = Arc::new(FakeApi::default());
        let connector = Arc::new(FakeConnector::default());
        let stream = stream(api.clone(), connector.clone(), None);
        stream.open().await;
        assert_eq!(stream.comment_count().await, 0);

        connector.peers.lock().await[0].disconnect();
        let author = identity("B", UserRole::Student).author();
        *api.comments.lock().await = vec![comment(stream.notice_id(), &author, "while away")];
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(connector.peer_count().await, 2);
        assert_eq!(
            connector.peers.lock().await[1].try_recv(),
            Some(ClientEvent::JoinNotice(stream.notice_id()))
        );
        assert_eq!(stream.state().await, CommentState::Ready);
        assert_eq!(stream.comment_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_stream_does_not_reconnect() {
        let connector = Arc::new(FakeConnector::default());
        let stream = stream(Arc::new(FakeApi::default()), connector.clone(), None);
        stream.open().await;

        stream.close().await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(connector.peer_count().await, 1);
    }
}
