// This is the infra layer - it implements the traits defined in core.
// This file provides an IN-MEMORY implementation of ListingStore.
//
// **Why keep an in-memory store?**
// - Service tests run without touching the filesystem
// - Local development works without a database file
// - It documents the feed semantics in plain Rust, next to the SQL version
//
// The feed filtering here must stay in lockstep with the SQL in
// sqlite_listing_store.rs; when one changes, change the other.

use crate::core::listings::{
    FeedPage, FeedQuery, Listing, ListingError, ListingStatus, ListingStore, ListingType,
    SortOrder,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

pub struct InMemoryListingStore {
    data: DashMap<i64, Listing>,
    next_id: AtomicI64,
}

impl InMemoryListingStore {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryListingStore {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_query(listing: &Listing, query: &FeedQuery) -> bool {
    if listing.status != ListingStatus::Active {
        return false;
    }
    if query.free_only && listing.listing_type != ListingType::Free {
        return false;
    }
    if !query.free_only {
        if let Some(t) = query.listing_type {
            if listing.listing_type != t {
                return false;
            }
        }
    }
    if let Some(category) = &query.category {
        if &listing.category != category {
            return false;
        }
    }
    if let Some(subcategory) = &query.subcategory {
        if listing.subcategory.as_deref() != Some(subcategory.as_str()) {
            return false;
        }
    }
    if let Some(min) = query.min_price {
        if listing.price < min {
            return false;
        }
    }
    if let Some(max) = query.max_price {
        if listing.price > max {
            return false;
        }
    }
    if let Some(search) = &query.search {
        let needle = search.trim().to_lowercase();
        if !needle.is_empty()
            && !listing.title.to_lowercase().contains(&needle)
            && !listing.description.to_lowercase().contains(&needle)
        {
            return false;
        }
    }
    true
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn insert(&self, listing: &Listing) -> Result<i64, ListingError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut stored = listing.clone();
        stored.id = id;
        self.data.insert(id, stored);
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Option<Listing>, ListingError> {
        Ok(self.data.get(&id).map(|entry| entry.clone()))
    }

    async fn update(&self, listing: &Listing) -> Result<(), ListingError> {
        match self.data.get_mut(&listing.id) {
            Some(mut entry) => {
                *entry = listing.clone();
                Ok(())
            }
            None => Err(ListingError::NotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), ListingError> {
        self.data.remove(&id);
        Ok(())
    }

    async fn by_author(&self, author_id: u64) -> Result<Vec<Listing>, ListingError> {
        let mut listings: Vec<Listing> = self
            .data
            .iter()
            .filter(|entry| entry.author_id == author_id)
            .map(|entry| entry.clone())
            .collect();
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    async fn browse(&self, query: &FeedQuery) -> Result<FeedPage, ListingError> {
        let mut matched: Vec<Listing> = self
            .data
            .iter()
            .filter(|entry| matches_query(entry.value(), query))
            .map(|entry| entry.clone())
            .collect();

        match query.sort {
            SortOrder::Newest => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::PriceAsc => matched.sort_by(|a, b| {
                a.price
                    .partial_cmp(&b.price)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(b.created_at.cmp(&a.created_at))
            }),
            SortOrder::PriceDesc => matched.sort_by(|a, b| {
                b.price
                    .partial_cmp(&a.price)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(b.created_at.cmp(&a.created_at))
            }),
        }

        let total = matched.len() as u32;
        let items: Vec<Listing> = matched
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.per_page as usize)
            .collect();

        Ok(FeedPage {
            items,
            total,
            page: query.page,
            per_page: query.per_page,
        })
    }

    async fn set_status(&self, id: i64, status: ListingStatus) -> Result<(), ListingError> {
        match self.data.get_mut(&id) {
            Some(mut entry) => {
                entry.status = status;
                Ok(())
            }
            None => Err(ListingError::NotFound),
        }
    }

    async fn increment_views(&self, id: i64) -> Result<(), ListingError> {
        if let Some(mut entry) = self.data.get_mut(&id) {
            entry.views += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::listings::{ContactInfo, ListingType};
    use chrono::{Duration, Utc};

    fn listing(id_hint: u64, title: &str, price: f64, age_minutes: i64) -> Listing {
        let created = Utc::now() - Duration::minutes(age_minutes);
        Listing {
            id: 0,
            author_id: id_hint,
            title: title.to_string(),
            description: "Опис для тестового оголошення".to_string(),
            price,
            listing_type: ListingType::Sell,
            category: "electronics".to_string(),
            subcategory: None,
            images: vec![],
            contact: ContactInfo::default(),
            location: None,
            status: ListingStatus::Active,
            views: 0,
            created_at: created,
            updated_at: created,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = InMemoryListingStore::new();

        let a = store.insert(&listing(1, "Перший", 100.0, 0)).await.unwrap();
        let b = store.insert(&listing(1, "Другий", 200.0, 0)).await.unwrap();

        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(store.get(a).await.unwrap().unwrap().title, "Перший");
    }

    #[tokio::test]
    async fn test_browse_filters_and_sorts() {
        let store = InMemoryListingStore::new();
        store
            .insert(&listing(1, "Ноутбук Lenovo", 7000.0, 30))
            .await
            .unwrap();
        store
            .insert(&listing(1, "Телефон Samsung", 4000.0, 10))
            .await
            .unwrap();

        let mut cheap = listing(2, "Зарядка USB", 150.0, 5);
        cheap.status = ListingStatus::Sold;
        store.insert(&cheap).await.unwrap();

        // sold listings never show up
        let page = store.browse(&FeedQuery::default()).await.unwrap();
        assert_eq!(page.total, 2);
        // newest first
        assert_eq!(page.items[0].title, "Телефон Samsung");

        let page = store
            .browse(&FeedQuery {
                sort: SortOrder::PriceAsc,
                ..FeedQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items[0].price, 4000.0);

        let page = store
            .browse(&FeedQuery {
                search: Some("lenovo".to_string()),
                ..FeedQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Ноутбук Lenovo");
    }

    #[tokio::test]
    async fn test_browse_paginates() {
        let store = InMemoryListingStore::new();
        for i in 0..5 {
            store
                .insert(&listing(1, &format!("Оголошення {i}"), 100.0, i))
                .await
                .unwrap();
        }

        let page = store
            .browse(&FeedQuery {
                page: 2,
                per_page: 2,
                ..FeedQuery::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.page, 2);
    }

    #[tokio::test]
    async fn test_price_band_filter() {
        let store = InMemoryListingStore::new();
        store.insert(&listing(1, "Дешевше", 100.0, 0)).await.unwrap();
        store.insert(&listing(1, "Середнє", 500.0, 0)).await.unwrap();
        store.insert(&listing(1, "Дорожче", 900.0, 0)).await.unwrap();

        let page = store
            .browse(&FeedQuery {
                min_price: Some(200.0),
                max_price: Some(800.0),
                ..FeedQuery::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Середнє");
    }
}
