// This is the listings module - it contains ALL the business logic for
// creating and browsing classified ads. No HTTP types and no SQL in here:
// the service works against the ListingStore trait and the api layer is
// just a thin translation on top.
//
// Every mutation runs the moderation validators before anything reaches
// storage. The same pure functions also back the client-side advisory
// pre-check endpoint, so the two can never disagree.

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use super::listing_models::{
    FeedPage, FeedQuery, Listing, ListingStatus, NewListing, MAX_LISTING_IMAGES,
};
use crate::core::categories::category_catalog;
use crate::core::moderation::{self, Verdict};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ListingError {
    /// A moderation rule rejected the content. The verdict carries the
    /// reason key the client maps to a localized message.
    #[error("content rejected: {}", .0.reason.map(|r| r.as_key()).unwrap_or("unknown"))]
    Rejected(Verdict),

    #[error("listing not found")]
    NotFound,

    #[error("only the author can modify a listing")]
    NotOwner,

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("too many images: limit is {0}")]
    TooManyImages(usize),

    #[error("storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================
// The core defines WHAT it needs from storage, not HOW it's implemented.
// SQLite in production, an in-memory map in tests.

#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Persist a new listing and return its assigned id.
    async fn insert(&self, listing: &Listing) -> Result<i64, ListingError>;

    async fn get(&self, id: i64) -> Result<Option<Listing>, ListingError>;

    /// Replace a stored listing wholesale, matched by `listing.id`.
    async fn update(&self, listing: &Listing) -> Result<(), ListingError>;

    async fn delete(&self, id: i64) -> Result<(), ListingError>;

    async fn by_author(&self, author_id: u64) -> Result<Vec<Listing>, ListingError>;

    /// Run the feed query. The query is already normalized.
    async fn browse(&self, query: &FeedQuery) -> Result<FeedPage, ListingError>;

    async fn set_status(&self, id: i64, status: ListingStatus) -> Result<(), ListingError>;

    /// Bump the denormalized view counter.
    async fn increment_views(&self, id: i64) -> Result<(), ListingError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct ListingService<S: ListingStore> {
    store: S,
}

impl<S: ListingStore> ListingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validate and persist a new listing.
    ///
    /// Moderation runs first (title, then description, then price), so the
    /// first failing rule is the one reported. Category and image checks
    /// come after, mirroring the order the create form surfaces errors.
    pub async fn create(&self, author_id: u64, new: NewListing) -> Result<Listing, ListingError> {
        Self::validate_content(&new)?;
        Self::validate_shape(&new)?;

        let now = Utc::now();
        let mut listing = Listing {
            id: 0,
            author_id,
            title: new.title.trim().to_string(),
            description: new.description.trim().to_string(),
            price: new.price,
            listing_type: new.listing_type,
            category: new.category,
            subcategory: new.subcategory,
            images: new.images,
            contact: new.contact,
            location: new.location,
            status: ListingStatus::Active,
            views: 0,
            created_at: now,
            updated_at: now,
        };
        listing.id = self.store.insert(&listing).await?;
        Ok(listing)
    }

    /// Full replacement of an existing listing, author-only, re-validated
    /// from scratch.
    pub async fn update(
        &self,
        id: i64,
        author_id: u64,
        new: NewListing,
    ) -> Result<Listing, ListingError> {
        let current = self.require_owned(id, author_id).await?;

        Self::validate_content(&new)?;
        Self::validate_shape(&new)?;

        let updated = Listing {
            id: current.id,
            author_id: current.author_id,
            title: new.title.trim().to_string(),
            description: new.description.trim().to_string(),
            price: new.price,
            listing_type: new.listing_type,
            category: new.category,
            subcategory: new.subcategory,
            images: new.images,
            contact: new.contact,
            location: new.location,
            status: current.status,
            views: current.views,
            created_at: current.created_at,
            updated_at: Utc::now(),
        };
        self.store.update(&updated).await?;
        Ok(updated)
    }

    pub async fn get(&self, id: i64) -> Result<Listing, ListingError> {
        self.store.get(id).await?.ok_or(ListingError::NotFound)
    }

    /// Bump the view counter. Missing listings are ignored so a stale
    /// client tab cannot turn into an error response.
    pub async fn record_view(&self, id: i64) -> Result<(), ListingError> {
        self.store.increment_views(id).await
    }

    pub async fn browse(&self, query: FeedQuery) -> Result<FeedPage, ListingError> {
        let query = query.normalized();
        self.store.browse(&query).await
    }

    pub async fn my_listings(&self, author_id: u64) -> Result<Vec<Listing>, ListingError> {
        self.store.by_author(author_id).await
    }

    pub async fn set_status(
        &self,
        id: i64,
        author_id: u64,
        status: ListingStatus,
    ) -> Result<(), ListingError> {
        self.require_owned(id, author_id).await?;
        self.store.set_status(id, status).await
    }

    pub async fn delete(&self, id: i64, author_id: u64) -> Result<(), ListingError> {
        self.require_owned(id, author_id).await?;
        self.store.delete(id).await
    }

    async fn require_owned(&self, id: i64, author_id: u64) -> Result<Listing, ListingError> {
        let listing = self.store.get(id).await?.ok_or(ListingError::NotFound)?;
        if listing.author_id != author_id {
            return Err(ListingError::NotOwner);
        }
        Ok(listing)
    }

    /// The moderation gate: title, description, price, in that order.
    fn validate_content(new: &NewListing) -> Result<(), ListingError> {
        for verdict in [
            moderation::validate_title(&new.title),
            moderation::validate_description(&new.description),
            moderation::validate_price(new.price, new.listing_type),
        ] {
            if !verdict.valid {
                return Err(ListingError::Rejected(verdict));
            }
        }
        Ok(())
    }

    /// Structural checks that are not moderation: catalog membership and
    /// the image cap.
    fn validate_shape(new: &NewListing) -> Result<(), ListingError> {
        if !category_catalog::selection_is_valid(&new.category, new.subcategory.as_deref()) {
            return Err(ListingError::UnknownCategory(new.category.clone()));
        }
        if new.images.len() > MAX_LISTING_IMAGES {
            return Err(ListingError::TooManyImages(MAX_LISTING_IMAGES));
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::listings::listing_models::{ContactInfo, ListingType, FEED_PER_PAGE_MAX};
    use crate::core::moderation::ReasonCode;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    /// In-memory stand-in for the SQLite store.
    struct MockListingStore {
        items: Mutex<Vec<Listing>>,
        next_id: AtomicI64,
    }

    impl MockListingStore {
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
    impl ListingStore for MockListingStore {
        async fn insert(&self, listing: &Listing) -> Result<i64, ListingError> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let mut stored = listing.clone();
            stored.id = id;
            self.items.lock().unwrap().push(stored);
            Ok(id)
        }

        async fn get(&self, id: i64) -> Result<Option<Listing>, ListingError> {
            Ok(self
                .items
                .lock()
                .unwrap()
                .iter()
                .find(|l| l.id == id)
                .cloned())
        }

        async fn update(&self, listing: &Listing) -> Result<(), ListingError> {
            let mut items = self.items.lock().unwrap();
            match items.iter_mut().find(|l| l.id == listing.id) {
                Some(slot) => {
                    *slot = listing.clone();
                    Ok(())
                }
                None => Err(ListingError::NotFound),
            }
        }

        async fn delete(&self, id: i64) -> Result<(), ListingError> {
            self.items.lock().unwrap().retain(|l| l.id != id);
            Ok(())
        }

        async fn by_author(&self, author_id: u64) -> Result<Vec<Listing>, ListingError> {
            Ok(self
                .items
                .lock()
                .unwrap()
                .iter()
                .filter(|l| l.author_id == author_id)
                .cloned()
                .collect())
        }

        async fn browse(&self, query: &FeedQuery) -> Result<FeedPage, ListingError> {
            let items = self.items.lock().unwrap();
            let active: Vec<Listing> = items
                .iter()
                .filter(|l| l.status == ListingStatus::Active)
                .cloned()
                .collect();
            Ok(FeedPage {
                total: active.len() as u32,
                items: active,
                page: query.page,
                per_page: query.per_page,
            })
        }

        async fn set_status(&self, id: i64, status: ListingStatus) -> Result<(), ListingError> {
            let mut items = self.items.lock().unwrap();
            match items.iter_mut().find(|l| l.id == id) {
                Some(l) => {
                    l.status = status;
                    Ok(())
                }
                None => Err(ListingError::NotFound),
            }
        }

        async fn increment_views(&self, id: i64) -> Result<(), ListingError> {
            let mut items = self.items.lock().unwrap();
            if let Some(l) = items.iter_mut().find(|l| l.id == id) {
                l.views += 1;
            }
            Ok(())
        }
    }

    fn valid_listing() -> NewListing {
        NewListing {
            title: "Продам диван у гарному стані".to_string(),
            description: "Майже новий, самовивіз з Подолу".to_string(),
            price: 2500.0,
            listing_type: ListingType::Sell,
            category: "furniture".to_string(),
            subcategory: None,
            images: vec![],
            contact: ContactInfo {
                phone: None,
                telegram: Some("seller".to_string()),
            },
            location: None,
        }
    }

    #[tokio::test]
    async fn test_create_persists_valid_listing() {
        let service = ListingService::new(MockListingStore::new());

        let listing = service.create(42, valid_listing()).await.unwrap();

        assert_eq!(listing.id, 1);
        assert_eq!(listing.author_id, 42);
        assert_eq!(listing.status, ListingStatus::Active);
        assert_eq!(listing.views, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_title_before_storage() {
        let store = MockListingStore::new();
        let service = ListingService::new(store);

        let mut bad = valid_listing();
        bad.title = "Ок".to_string();

        let err = service.create(42, bad).await.unwrap_err();
        match err {
            ListingError::Rejected(verdict) => {
                assert_eq!(verdict.reason, Some(ReasonCode::TitleTooShort));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_price_over_ceiling() {
        let service = ListingService::new(MockListingStore::new());

        let mut bad = valid_listing();
        bad.price = 100_000.0;

        let err = service.create(42, bad).await.unwrap_err();
        match err {
            ListingError::Rejected(verdict) => {
                assert_eq!(verdict.reason, Some(ReasonCode::PriceMaxExceeded));
                assert_eq!(verdict.params.unwrap().max_price, Some(50_000.0));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_category() {
        let service = ListingService::new(MockListingStore::new());

        let mut bad = valid_listing();
        bad.category = "spaceships".to_string();

        let err = service.create(42, bad).await.unwrap_err();
        assert!(matches!(err, ListingError::UnknownCategory(c) if c == "spaceships"));
    }

    #[tokio::test]
    async fn test_create_rejects_too_many_images() {
        let service = ListingService::new(MockListingStore::new());

        let mut bad = valid_listing();
        bad.images = (0..6).map(|i| format!("img{i}.jpg")).collect();

        let err = service.create(42, bad).await.unwrap_err();
        assert!(matches!(err, ListingError::TooManyImages(5)));
    }

    #[tokio::test]
    async fn test_rejected_listing_never_reaches_store() {
        let service = ListingService::new(MockListingStore::new());

        let mut bad = valid_listing();
        bad.title = "дешево www.spam.ua дивись".to_string();
        let _ = service.create(42, bad).await;

        assert_eq!(service.store.count(), 0);
    }

    #[tokio::test]
    async fn test_update_is_author_only() {
        let service = ListingService::new(MockListingStore::new());
        let listing = service.create(42, valid_listing()).await.unwrap();

        let err = service
            .update(listing.id, 99, valid_listing())
            .await
            .unwrap_err();
        assert!(matches!(err, ListingError::NotOwner));
    }

    #[tokio::test]
    async fn test_update_preserves_identity_fields() {
        let service = ListingService::new(MockListingStore::new());
        let listing = service.create(42, valid_listing()).await.unwrap();
        service.record_view(listing.id).await.unwrap();

        let mut changed = valid_listing();
        changed.price = 1800.0;
        let updated = service.update(listing.id, 42, changed).await.unwrap();

        assert_eq!(updated.id, listing.id);
        assert_eq!(updated.views, 1);
        assert_eq!(updated.created_at, listing.created_at);
        assert_eq!(updated.price, 1800.0);
    }

    #[tokio::test]
    async fn test_set_status_and_delete_check_ownership() {
        let service = ListingService::new(MockListingStore::new());
        let listing = service.create(42, valid_listing()).await.unwrap();

        let err = service
            .set_status(listing.id, 99, ListingStatus::Sold)
            .await
            .unwrap_err();
        assert!(matches!(err, ListingError::NotOwner));

        service
            .set_status(listing.id, 42, ListingStatus::Sold)
            .await
            .unwrap();
        assert_eq!(
            service.get(listing.id).await.unwrap().status,
            ListingStatus::Sold
        );

        let err = service.delete(listing.id, 99).await.unwrap_err();
        assert!(matches!(err, ListingError::NotOwner));
        service.delete(listing.id, 42).await.unwrap();
        assert!(matches!(
            service.get(listing.id).await,
            Err(ListingError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_browse_caps_page_size() {
        let service = ListingService::new(MockListingStore::new());
        service.create(42, valid_listing()).await.unwrap();

        let page = service
            .browse(FeedQuery {
                per_page: 500,
                ..FeedQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.per_page, FEED_PER_PAGE_MAX);
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_get_missing_listing_is_not_found() {
        let service = ListingService::new(MockListingStore::new());
        assert!(matches!(
            service.get(12345).await,
            Err(ListingError::NotFound)
        ));
    }
}
