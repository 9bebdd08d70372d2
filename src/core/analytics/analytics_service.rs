// Lightweight usage counters: listing views and search queries.
//
// Analytics must never break a user request. The api layer calls these
// fire-and-forget and only logs failures; nothing here sits on a hot
// path's critical line.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Longest search query worth recording.
const SEARCH_QUERY_MAX_CHARS: usize = 100;

/// Cap on the top-searches report size.
pub const TOP_SEARCHES_MAX: u32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStat {
    pub query: String,
    pub count: u32,
}

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("storage error: {0}")]
    StorageError(String),
}

#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    async fn record_view(
        &self,
        listing_id: i64,
        viewer_id: Option<u64>,
        at: DateTime<Utc>,
    ) -> Result<(), AnalyticsError>;

    async fn view_count(&self, listing_id: i64) -> Result<u64, AnalyticsError>;

    async fn record_search(
        &self,
        query: &str,
        result_count: u32,
        at: DateTime<Utc>,
    ) -> Result<(), AnalyticsError>;

    /// Most frequent normalized queries, highest count first.
    async fn top_searches(&self, limit: u32) -> Result<Vec<SearchStat>, AnalyticsError>;
}

pub struct AnalyticsService<S: AnalyticsStore> {
    store: S,
}

impl<S: AnalyticsStore> AnalyticsService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn record_listing_view(
        &self,
        listing_id: i64,
        viewer_id: Option<u64>,
    ) -> Result<(), AnalyticsError> {
        self.store
            .record_view(listing_id, viewer_id, Utc::now())
            .await
    }

    pub async fn listing_views(&self, listing_id: i64) -> Result<u64, AnalyticsError> {
        self.store.view_count(listing_id).await
    }

    /// Record a feed search. Queries are normalized (trimmed, lowercased,
    /// inner whitespace collapsed) so "Диван " and "диван" count as one.
    /// Empty and oversized queries are dropped silently.
    pub async fn record_search(
        &self,
        query: &str,
        result_count: u32,
    ) -> Result<(), AnalyticsError> {
        let normalized = normalize_query(query);
        if normalized.is_empty() || normalized.chars().count() > SEARCH_QUERY_MAX_CHARS {
            return Ok(());
        }
        self.store
            .record_search(&normalized, result_count, Utc::now())
            .await
    }

    pub async fn top_searches(&self, limit: u32) -> Result<Vec<SearchStat>, AnalyticsError> {
        let limit = limit.clamp(1, TOP_SEARCHES_MAX);
        self.store.top_searches(limit).await
    }
}

fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockAnalyticsStore {
        views: DashMap<i64, u64>,
        searches: Mutex<Vec<(String, u32)>>,
    }

    #[async_trait]
    impl AnalyticsStore for MockAnalyticsStore {
        async fn record_view(
            &self,
            listing_id: i64,
            _viewer_id: Option<u64>,
            _at: DateTime<Utc>,
        ) -> Result<(), AnalyticsError> {
            *self.views.entry(listing_id).or_insert(0) += 1;
            Ok(())
        }

        async fn view_count(&self, listing_id: i64) -> Result<u64, AnalyticsError> {
            Ok(self.views.get(&listing_id).map(|v| *v).unwrap_or(0))
        }

        async fn record_search(
            &self,
            query: &str,
            result_count: u32,
            _at: DateTime<Utc>,
        ) -> Result<(), AnalyticsError> {
            self.searches
                .lock()
                .unwrap()
                .push((query.to_string(), result_count));
            Ok(())
        }

        async fn top_searches(&self, limit: u32) -> Result<Vec<SearchStat>, AnalyticsError> {
            let searches = self.searches.lock().unwrap();
            let mut stats: Vec<SearchStat> = searches
                .iter()
                .map(|(q, _)| SearchStat {
                    query: q.clone(),
                    count: 1,
                })
                .collect();
            stats.truncate(limit as usize);
            Ok(stats)
        }
    }

    #[tokio::test]
    async fn test_views_accumulate() {
        let service = AnalyticsService::new(MockAnalyticsStore::default());

        service.record_listing_view(7, Some(42)).await.unwrap();
        service.record_listing_view(7, None).await.unwrap();

        assert_eq!(service.listing_views(7).await.unwrap(), 2);
        assert_eq!(service.listing_views(8).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_queries_are_normalized() {
        let service = AnalyticsService::new(MockAnalyticsStore::default());

        service.record_search("  Продам   Диван ", 5).await.unwrap();

        let searches = service.store.searches.lock().unwrap();
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0], ("продам диван".to_string(), 5));
    }

    #[tokio::test]
    async fn test_empty_and_oversized_queries_dropped() {
        let service = AnalyticsService::new(MockAnalyticsStore::default());

        service.record_search("   ", 0).await.unwrap();
        service.record_search(&"є".repeat(200), 0).await.unwrap();

        assert!(service.store.searches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_top_searches_clamps_limit() {
        let service = AnalyticsService::new(MockAnalyticsStore::default());
        for i in 0..60 {
            service
                .record_search(&format!("query {i}"), 1)
                .await
                .unwrap();
        }

        let top = service.top_searches(1000).await.unwrap();
        assert_eq!(top.len(), TOP_SEARCHES_MAX as usize);
    }
}
