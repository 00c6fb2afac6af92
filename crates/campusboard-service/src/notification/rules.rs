//! Recipient resolution for comment writes.

use campusboard_core::types::id::UserId;
use campusboard_entity::{Comment, Notice, NotificationKind};

/// A user who should get a notification for a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// The recipient.
    pub user_id: UserId,
    /// Record kind.
    pub kind: NotificationKind,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
}

/// Determines who is notified about a new comment.
///
/// The notice owner gets `new-comment`; for a reply, the parent comment's
/// author gets `comment-reply` instead. The commenter never appears, and
/// each user appears at most once.
pub fn comment_recipients(
    comment: &Comment,
    notice: &Notice,
    parent: Option<&Comment>,
) -> Vec<Recipient> {
    let actor = comment.author.id;
    let mut recipients: Vec<Recipient> = Vec::new();

    let reply_target = parent
        .map(|p| p.author.id)
        .filter(|&parent_author| parent_author != actor);

    let owner = notice.author.id;
    if owner != actor && Some(owner) != reply_target {
        recipients.push(Recipient {
            user_id: owner,
            kind: NotificationKind::NewComment,
            title: "New comment".to_string(),
            message: format!("{} commented on {}", comment.author.name, notice.title),
        });
    }

    if let Some(parent_author) = reply_target {
        recipients.push(Recipient {
            user_id: parent_author,
            kind: NotificationKind::CommentReply,
            title: "New reply".to_string(),
            message: format!(
                "{} replied to your comment on {}",
                comment.author.name, notice.title
            ),
        });
    }

    recipients
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusboard_core::types::id::{CommentId, NoticeId};
    use campusboard_entity::{Author, NoticePriority, UserRole};
    use chrono::Utc;

    fn author(name: &str) -> Author {
        Author {
            id: UserId::new(),
            name: name.into(),
            role: UserRole::Faculty,
            department: None,
        }
    }

    fn notice(owner: &Author) -> Notice {
        let now = Utc::now();
        Notice {
            id: NoticeId::new(),
            title: "notice 7".into(),
            content: "c".into(),
            category: "general".into(),
            department: "Civil".into(),
            priority: NoticePriority::Medium,
            author: owner.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn comment(by: &Author, notice: &Notice, parent: Option<CommentId>) -> Comment {
        let now = Utc::now();
        Comment {
            id: CommentId::new(),
            notice_id: notice.id,
            parent_comment_id: parent,
            content: "hi".into(),
            author: by.clone(),
            is_edited: false,
            replies: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_owner_notified_of_comment() {
        let a = author("A");
        let b = author("B");
        let n = notice(&a);
        let recipients = comment_recipients(&comment(&b, &n, None), &n, None);
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].user_id, a.id);
        assert_eq!(recipients[0].kind, NotificationKind::NewComment);
        assert_eq!(recipients[0].message, "B commented on notice 7");
    }

    #[test]
    fn test_no_self_notification() {
        let a = author("A");
        let n = notice(&a);
        assert!(comment_recipients(&comment(&a, &n, None), &n, None).is_empty());

        let parent = comment(&a, &n, None);
        let own_reply = comment(&a, &n, Some(parent.id));
        assert!(comment_recipients(&own_reply, &n, Some(&parent)).is_empty());
    }

    #[test]
    fn test_reply_notifies_parent_author_and_owner() {
        let owner = author("Owner");
        let student = author("Sam");
        let replier = author("Prof");
        let n = notice(&owner);
        let parent = comment(&student, &n, None);
        let reply = comment(&replier, &n, Some(parent.id));

        let recipients = comment_recipients(&reply, &n, Some(&parent));
        assert_eq!(recipients.len(), 2);
        assert_eq!(recipients[0].user_id, owner.id);
        assert_eq!(recipients[0].kind, NotificationKind::NewComment);
        assert_eq!(recipients[1].user_id, student.id);
        assert_eq!(recipients[1].kind, NotificationKind::CommentReply);
        assert_eq!(recipients[1].message, "Prof replied to your comment on notice 7");
    }

    #[test]
    fn test_owner_replying_in_thread_is_deduplicated() {
        let owner = author("Owner");
        let replier = author("Prof");
        let n = notice(&owner);
        let parent = comment(&owner, &n, None);
        let reply = comment(&replier, &n, Some(parent.id));

        let recipients = comment_recipients(&reply, &n, Some(&parent));
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].user_id, owner.id);
        assert_eq!(recipients[0].kind, NotificationKind::CommentReply);
    }
}
