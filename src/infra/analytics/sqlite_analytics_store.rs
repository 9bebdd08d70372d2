// SQLite-backed analytics store.
//
// Tables:
// - listing_views: one row per view event
// - search_log: one row per feed search

use crate::core::analytics::{AnalyticsError, AnalyticsStore, SearchStat};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteAnalyticsStore {
    pool: Pool<Sqlite>,
}

impl SqliteAnalyticsStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), AnalyticsError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS listing_views (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                listing_id INTEGER NOT NULL,
                viewer_id INTEGER,
                viewed_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_listing_views_listing
                ON listing_views(listing_id);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AnalyticsError::StorageError(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS search_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                query TEXT NOT NULL,
                result_count INTEGER NOT NULL,
                searched_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_search_log_query
                ON search_log(query);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AnalyticsError::StorageError(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl AnalyticsStore for SqliteAnalyticsStore {
    async fn record_view(
        &self,
        listing_id: i64,
        viewer_id: Option<u64>,
        at: DateTime<Utc>,
    ) -> Result<(), AnalyticsError> {
        sqlx::query(
            "INSERT INTO listing_views (listing_id, viewer_id, viewed_at) VALUES (?, ?, ?)",
        )
        .bind(listing_id)
        .bind(viewer_id.map(|v| v as i64))
        .bind(at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AnalyticsError::StorageError(e.to_string()))?;
        Ok(())
    }

    async fn view_count(&self, listing_id: i64) -> Result<u64, AnalyticsError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM listing_views WHERE listing_id = ?")
            .bind(listing_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AnalyticsError::StorageError(e.to_string()))?;

        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn record_search(
        &self,
        query: &str,
        result_count: u32,
        at: DateTime<Utc>,
    ) -> Result<(), AnalyticsError> {
        sqlx::query(
            "INSERT INTO search_log (query, result_count, searched_at) VALUES (?, ?, ?)",
        )
        .bind(query)
        .bind(result_count as i64)
        .bind(at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AnalyticsError::StorageError(e.to_string()))?;
        Ok(())
    }

    async fn top_searches(&self, limit: u32) -> Result<Vec<SearchStat>, AnalyticsError> {
        let rows = sqlx::query(
            r#"
            SELECT query, COUNT(*) AS n
            FROM search_log
            GROUP BY query
            ORDER BY n DESC, query ASC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AnalyticsError::StorageError(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|row| SearchStat {
                query: row.get("query"),
                count: row.get::<i64, _>("n") as u32,
            })
            .collect())
    }
}
