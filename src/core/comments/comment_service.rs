// Comments on listings: the one place buyers and sellers talk.
//
// Same layering as listings: moderation gate first, then storage, with
// the owner notification as a best-effort side effect. A comment that
// fails moderation never reaches the store, and a notification failure
// never loses a stored comment.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::listings::{Listing, ListingStatus};
use crate::core::moderation::{self, Verdict};
use crate::core::notifications::Notifier;

/// Longest comment snippet quoted inside the owner notification.
const NOTIFY_SNIPPET_CHARS: usize = 80;

/// Hard cap on a single comments page.
pub const COMMENTS_PAGE_MAX: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub listing_id: i64,
    pub author_id: u64,
    /// Display name captured at post time; profiles can change later.
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("comment rejected: {}", .0.reason.map(|r| r.as_key()).unwrap_or("unknown"))]
    Rejected(Verdict),

    #[error("comment not found")]
    NotFound,

    #[error("listing is not open for comments")]
    ListingNotOpen,

    #[error("not allowed to delete this comment")]
    NotAllowed,

    #[error("storage error: {0}")]
    StorageError(String),
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert(&self, comment: &Comment) -> Result<i64, CommentError>;

    async fn get(&self, id: i64) -> Result<Option<Comment>, CommentError>;

    /// Comments for a listing, oldest first.
    async fn list(
        &self,
        listing_id: i64,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Comment>, CommentError>;

    async fn delete(&self, id: i64) -> Result<(), CommentError>;
}

pub struct CommentService<S: CommentStore, N: Notifier> {
    store: S,
    notifier: N,
}

impl<S: CommentStore, N: Notifier> CommentService<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self { store, notifier }
    }

    /// Post a comment under a listing.
    ///
    /// The caller resolves the listing first (it owns that lookup); this
    /// method enforces the moderation gate and the listing's status, then
    /// pings the owner. Commenting on your own listing skips the ping.
    pub async fn add(
        &self,
        listing: &Listing,
        author_id: u64,
        author_name: &str,
        text: &str,
    ) -> Result<Comment, CommentError> {
        let verdict = moderation::validate_comment(text);
        if !verdict.valid {
            return Err(CommentError::Rejected(verdict));
        }

        if listing.status != ListingStatus::Active {
            return Err(CommentError::ListingNotOpen);
        }

        let mut comment = Comment {
            id: 0,
            listing_id: listing.id,
            author_id,
            author_name: author_name.trim().to_string(),
            text: text.trim().to_string(),
            created_at: Utc::now(),
        };
        comment.id = self.store.insert(&comment).await?;

        if author_id != listing.author_id {
            let message = format!(
                "💬 Нове повідомлення до «{}»: {}",
                listing.title,
                snippet(&comment.text)
            );
            if let Err(e) = self.notifier.send_message(listing.author_id, &message).await {
                tracing::warn!(
                    listing_id = listing.id,
                    owner_id = listing.author_id,
                    error = %e,
                    "failed to notify listing owner about a new comment"
                );
            }
        }

        Ok(comment)
    }

    pub async fn get(&self, id: i64) -> Result<Comment, CommentError> {
        self.store.get(id).await?.ok_or(CommentError::NotFound)
    }

    pub async fn list(
        &self,
        listing_id: i64,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Comment>, CommentError> {
        let limit = limit.clamp(1, COMMENTS_PAGE_MAX);
        self.store.list(listing_id, limit, offset).await
    }

    /// Delete a comment. Allowed for the comment author and for the
    /// owner of the listing it sits under.
    pub async fn delete(
        &self,
        comment_id: i64,
        requester_id: u64,
        listing_author_id: u64,
    ) -> Result<(), CommentError> {
        let comment = self.get(comment_id).await?;
        if requester_id != comment.author_id && requester_id != listing_author_id {
            return Err(CommentError::NotAllowed);
        }
        self.store.delete(comment_id).await
    }
}

fn snippet(text: &str) -> String {
    if text.chars().count() <= NOTIFY_SNIPPET_CHARS {
        text.to_string()
    } else {
        let cut: String = text.chars().take(NOTIFY_SNIPPET_CHARS).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::listings::{ContactInfo, ListingType};
    use crate::core::moderation::ReasonCode;
    use crate::core::notifications::NotifyError;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    struct MockCommentStore {
        items: Mutex<Vec<Comment>>,
        next_id: AtomicI64,
    }

    impl MockCommentStore {
        fn new() -> Self {
            Self {
                items: Mutex::new(Vec::new()),
                next_id: AtomicI64::new(1),
            }
        }

        fn count(&self) -> usize {
            self.items.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CommentStore for MockCommentStore {
        async fn insert(&self, comment: &Comment) -> Result<i64, CommentError> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let mut stored = comment.clone();
            stored.id = id;
            self.items.lock().unwrap().push(stored);
            Ok(id)
        }

        async fn get(&self, id: i64) -> Result<Option<Comment>, CommentError> {
            Ok(self
                .items
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id == id)
                .cloned())
        }

        async fn list(
            &self,
            listing_id: i64,
            limit: u32,
            offset: u32,
        ) -> Result<Vec<Comment>, CommentError> {
            Ok(self
                .items
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.listing_id == listing_id)
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn delete(&self, id: i64) -> Result<(), CommentError> {
            self.items.lock().unwrap().retain(|c| c.id != id);
            Ok(())
        }
    }

    /// Records every message instead of sending it.
    struct RecordingNotifier {
        sent: Mutex<Vec<(u64, String)>>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_message(&self, chat_id: u64, text: &str) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push((chat_id, text.to_string()));
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send_message(&self, _: u64, _: &str) -> Result<(), NotifyError> {
            Err(NotifyError::Transport("offline".to_string()))
        }
    }

    fn listing_owned_by(author_id: u64) -> Listing {
        Listing {
            id: 7,
            author_id,
            title: "Продам диван".to_string(),
            description: "Стан гарний, самовивіз".to_string(),
            price: 2500.0,
            listing_type: ListingType::Sell,
            category: "furniture".to_string(),
            subcategory: None,
            images: vec![],
            contact: ContactInfo::default(),
            location: None,
            status: ListingStatus::Active,
            views: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_add_comment_notifies_owner() {
        let service = CommentService::new(MockCommentStore::new(), RecordingNotifier::new());
        let listing = listing_owned_by(42);

        let comment = service
            .add(&listing, 99, "Buyer", "Ще актуально?")
            .await
            .unwrap();

        assert_eq!(comment.id, 1);
        assert_eq!(comment.listing_id, 7);

        let sent = service.notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 42);
        assert!(sent[0].1.contains("Ще актуально?"));
    }

    #[tokio::test]
    async fn test_own_comment_skips_notification() {
        let service = CommentService::new(MockCommentStore::new(), RecordingNotifier::new());
        let listing = listing_owned_by(42);

        service
            .add(&listing, 42, "Seller", "Підніму оголошення")
            .await
            .unwrap();

        assert!(service.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_comment_never_stored_or_notified() {
        let service = CommentService::new(MockCommentStore::new(), RecordingNotifier::new());
        let listing = listing_owned_by(42);

        let err = service
            .add(&listing, 99, "Buyer", "тут поруч казино")
            .await
            .unwrap_err();

        match err {
            CommentError::Rejected(verdict) => {
                assert_eq!(verdict.reason, Some(ReasonCode::CommentBlockedWords));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
        assert_eq!(service.store.count(), 0);
        assert!(service.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notify_failure_keeps_comment() {
        let service = CommentService::new(MockCommentStore::new(), FailingNotifier);
        let listing = listing_owned_by(42);

        let comment = service
            .add(&listing, 99, "Buyer", "Ще актуально?")
            .await
            .unwrap();

        assert_eq!(comment.id, 1);
        assert_eq!(service.store.count(), 1);
    }

    #[tokio::test]
    async fn test_archived_listing_rejects_comments() {
        let service = CommentService::new(MockCommentStore::new(), RecordingNotifier::new());
        let mut listing = listing_owned_by(42);
        listing.status = ListingStatus::Archived;

        let err = service
            .add(&listing, 99, "Buyer", "Ще актуально?")
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::ListingNotOpen));
    }

    #[tokio::test]
    async fn test_delete_permissions() {
        let service = CommentService::new(MockCommentStore::new(), RecordingNotifier::new());
        let listing = listing_owned_by(42);

        let comment = service
            .add(&listing, 99, "Buyer", "Ще актуально?")
            .await
            .unwrap();

        // a stranger cannot delete
        let err = service
            .delete(comment.id, 7, listing.author_id)
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::NotAllowed));

        // the listing owner can
        service
            .delete(comment.id, 42, listing.author_id)
            .await
            .unwrap();
        assert_eq!(service.store.count(), 0);

        // and so can the comment author
        let comment = service
            .add(&listing, 99, "Buyer", "Передумав, беру")
            .await
            .unwrap();
        service
            .delete(comment.id, 99, listing.author_id)
            .await
            .unwrap();
        assert_eq!(service.store.count(), 0);
    }
}
