//! Comment thread state for one notice.
//!
//! Top-level comments are kept newest first with one level of replies
//! under each. Every change is keyed by comment id, so snapshots, live
//! updates and local writes converge in any order.

use std::collections::HashMap;

use chrono::Utc;

use campusboard_core::types::id::{CommentId, CorrelationId, NoticeId};
use campusboard_entity::Comment;
use campusboard_realtime::{ClientEvent, CommentUpdate, ServerEvent};

/// Load state of a comment view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentState {
    /// Not opened, or closed.
    #[default]
    Idle,
    /// A snapshot is in flight. Changes are applied and also replayed over it.
    Loading,
    /// The snapshot has been applied.
    Ready,
}

/// The comment thread of one notice.
///
/// Writes made while a snapshot is loading, local or remote, are kept
/// and replayed on top of it, so an older snapshot never erases them.
/// Local adds are tracked by correlation id until their echo returns.
#[derive(Debug, Clone)]
pub struct CommentView {
    notice_id: NoticeId,
    comments: Vec<Comment>,
    orphans: Vec<Comment>,
    state: CommentState,
    buffered: Vec<CommentUpdate>,
    loads: usize,
    pending: HashMap<CorrelationId, CommentId>,
}

impl CommentView {
    /// An empty, idle view for `notice_id`.
    pub fn new(notice_id: NoticeId) -> Self {
        Self {
            notice_id,
            comments: Vec::new(),
            orphans: Vec::new(),
            state: CommentState::Idle,
            buffered: Vec::new(),
            loads: 0,
            pending: HashMap::new(),
        }
    }

    pub fn notice_id(&self) -> NoticeId {
        self.notice_id
    }

    /// Top-level comments, newest first, with their replies.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Whether a snapshot has been applied yet.
    pub fn state(&self) -> CommentState {
        self.state
    }

    /// Top-level comments plus their replies.
    pub fn comment_count(&self) -> usize {
        self.comments.iter().map(Comment::thread_len).sum()
    }

    /// Local writes whose echo has not come back yet.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn contains(&self, id: CommentId) -> bool {
        self.comments
            .iter()
            .any(|c| c.id == id || c.replies.iter().any(|r| r.id == id))
            || self.orphans.iter().any(|c| c.id == id)
    }

    /// Marks a snapshot as in flight.
    pub fn begin_load(&mut self) {
        if self.loads == 0 {
            self.buffered.clear();
        }
        self.loads += 1;
        self.state = CommentState::Loading;
    }

    /// Replaces the thread with a newest-first snapshot and replays the
    /// updates that arrived while it was loading. Local adds the snapshot
    /// already contains are settled. Updates stay buffered until the last
    /// overlapping load has landed.
    pub fn apply_snapshot(&mut self, snapshot: Vec<Comment>) {
        self.loads = self.loads.saturating_sub(1);
        self.pending.retain(|_, id| {
            !snapshot
                .iter()
                .any(|c| c.id == *id || c.replies.iter().any(|r| r.id == *id))
        });
        let orphans = std::mem::take(&mut self.orphans);
        self.comments.clear();
        for comment in snapshot.into_iter().rev().chain(orphans) {
            self.insert(comment);
        }
        let buffered = std::mem::take(&mut self.buffered);
        for update in &buffered {
            self.apply(update);
        }
        if self.loads == 0 {
            self.state = CommentState::Ready;
        } else {
            self.buffered = buffered;
        }
    }

    /// Applies a relayed update. Updates for other notices are ignored.
    ///
    /// The echo of one of this view's own adds settles the pending write and
    /// is not applied again, so a comment deleted locally in the meantime
    /// stays deleted.
    pub fn apply_remote(&mut self, update: &CommentUpdate) -> bool {
        if update.notice_id() != self.notice_id {
            return false;
        }
        if let CommentUpdate::Add {
            correlation_id: Some(correlation_id),
            ..
        } = update
        {
            if self.pending.remove(correlation_id).is_some() {
                return false;
            }
        }
        self.record(update.clone());
        self.apply(update)
    }

    /// Applies a server broadcast that concerns this notice.
    pub fn apply_server_event(&mut self, event: &ServerEvent) -> bool {
        let update = match event {
            ServerEvent::CommentUpdate(update) => return self.apply_remote(update),
            ServerEvent::CommentEdited(comment) => CommentUpdate::Edit {
                notice_id: comment.notice_id,
                comment_id: comment.id,
                content: comment.content.clone(),
            },
            ServerEvent::CommentDeleted { id, notice_id } => CommentUpdate::Delete {
                notice_id: *notice_id,
                comment_id: *id,
            },
            _ => return false,
        };
        self.apply_remote(&update)
    }

    /// Applies a comment this client just created and returns the
    /// event that tells other viewers about it.
    pub fn local_add(&mut self, comment: Comment, correlation_id: CorrelationId) -> ClientEvent {
        self.pending.insert(correlation_id, comment.id);
        let update = CommentUpdate::Add {
            notice_id: self.notice_id,
            comment: comment.clone(),
            correlation_id: Some(correlation_id),
        };
        self.apply(&update);
        self.record(update);
        ClientEvent::CommentAdded {
            notice_id: self.notice_id,
            comment,
            correlation_id: Some(correlation_id),
        }
    }

    /// Applies an edit this client just saved.
    pub fn local_edit(&mut self, comment_id: CommentId, content: String) -> ClientEvent {
        self.edit(comment_id, &content);
        self.record(CommentUpdate::Edit {
            notice_id: self.notice_id,
            comment_id,
            content: content.clone(),
        });
        ClientEvent::CommentEdited {
            notice_id: self.notice_id,
            comment_id,
            content,
        }
    }

    /// Removes a comment this client just deleted.
    pub fn local_delete(&mut self, comment_id: CommentId) -> ClientEvent {
        self.remove(comment_id);
        self.record(CommentUpdate::Delete {
            notice_id: self.notice_id,
            comment_id,
        });
        ClientEvent::CommentDeleted {
            notice_id: self.notice_id,
            comment_id,
        }
    }

    /// Empties the view and forgets pending writes.
    pub fn reset(&mut self) {
        self.comments.clear();
        self.orphans.clear();
        self.buffered.clear();
        self.loads = 0;
        self.pending.clear();
        self.state = CommentState::Idle;
    }

    /// Keeps a change for replay while a snapshot is in flight.
    fn record(&mut self, update: CommentUpdate) {
        if self.state == CommentState::Loading {
            self.buffered.push(update);
        }
    }

    fn apply(&mut self, update: &CommentUpdate) -> bool {
        match update {
            CommentUpdate::Add { comment, .. } => self.insert(comment.clone()),
            CommentUpdate::Edit {
                comment_id,
                content,
                ..
            } => self.edit(*comment_id, content),
            CommentUpdate::Delete { comment_id, .. } => self.remove(*comment_id),
        }
    }

    fn insert(&mut self, mut comment: Comment) -> bool {
        if comment.notice_id != self.notice_id || self.contains(comment.id) {
            return false;
        }

        let Some(parent_id) = comment.parent_comment_id else {
            let mut waiting = Vec::new();
            self.orphans.retain(|o| {
                if o.parent_comment_id == Some(comment.id) {
                    waiting.push(o.clone());
                    false
                } else {
                    true
                }
            });
            for reply in waiting {
                if !comment.replies.iter().any(|r| r.id == reply.id) {
                    comment.replies.push(reply);
                }
            }
            self.comments.insert(0, comment);
            return true;
        };

        match self.comments.iter_mut().find(|c| c.id == parent_id) {
            Some(parent) => parent.replies.push(comment),
            None => self.orphans.push(comment),
        }
        true
    }

    fn find_mut(&mut self, id: CommentId) -> Option<&mut Comment> {
        self.comments.iter_mut().find_map(|c| {
            if c.id == id {
                Some(c)
            } else {
                c.replies.iter_mut().find(|r| r.id == id)
            }
        })
    }

    fn edit(&mut self, id: CommentId, content: &str) -> bool {
        let Some(comment) = self.find_mut(id) else {
            return false;
        };
        comment.content = content.to_string();
        comment.is_edited = true;
        comment.updated_at = Utc::now();
        true
    }

    fn remove(&mut self, id: CommentId) -> bool {
        if let Some(index) = self.comments.iter().position(|c| c.id == id) {
            self.comments.remove(index);
            return true;
        }
        for parent in &mut self.comments {
            if let Some(index) = parent.replies.iter().position(|r| r.id == id) {
                parent.replies.remove(index);
                return true;
            }
        }
        if let Some(index) = self.orphans.iter().position(|o| o.id == id) {
            self.orphans.remove(index);
            return true;
        }
        false
    }
}
