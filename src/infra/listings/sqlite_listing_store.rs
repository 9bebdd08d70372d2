// SQLite-backed listing store.
//
// Tables:
// - listings: one row per classified ad
//
// Images are stored as a JSON array of paths in a TEXT column, contacts
// are flattened into two nullable columns. Timestamps are RFC 3339 text,
// which sorts correctly as a string.

use crate::core::listings::{
    ContactInfo, FeedPage, FeedQuery, Listing, ListingError, ListingStatus, ListingStore,
    ListingType, SortOrder,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, QueryBuilder, Row, Sqlite};

pub struct SqliteListingStore {
    pool: Pool<Sqlite>,
}

impl SqliteListingStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), ListingError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS listings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                price REAL NOT NULL,
                listing_type TEXT NOT NULL,
                category TEXT NOT NULL,
                subcategory TEXT,
                images TEXT NOT NULL DEFAULT '[]',
                contact_phone TEXT,
                contact_telegram TEXT,
                location TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                views INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_listings_feed
                ON listings(status, category, created_at);
            CREATE INDEX IF NOT EXISTS idx_listings_author
                ON listings(author_id);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ListingError::StorageError(e.to_string()))?;

        Ok(())
    }
}

/// Shared WHERE clause for the feed query and its COUNT twin.
fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &FeedQuery) {
    qb.push(" WHERE status = 'active'");

    if query.free_only {
        qb.push(" AND listing_type = 'free'");
    } else if let Some(t) = query.listing_type {
        qb.push(" AND listing_type = ").push_bind(t.as_str());
    }
    if let Some(category) = &query.category {
        qb.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(subcategory) = &query.subcategory {
        qb.push(" AND subcategory = ").push_bind(subcategory.clone());
    }
    if let Some(min) = query.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = query.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
    if let Some(search) = &query.search {
        let like = format!("%{}%", search.trim());
        qb.push(" AND (title LIKE ").push_bind(like.clone());
        qb.push(" OR description LIKE ").push_bind(like);
        qb.push(")");
    }
}

fn row_to_listing(row: &SqliteRow) -> Listing {
    let images_json: String = row.get("images");
    let type_str: String = row.get("listing_type");
    let status_str: String = row.get("status");

    Listing {
        id: row.get("id"),
        author_id: row.get::<i64, _>("author_id") as u64,
        title: row.get("title"),
        description: row.get("description"),
        price: row.get("price"),
        listing_type: ListingType::from_str(&type_str).unwrap_or(ListingType::Sell),
        category: row.get("category"),
        subcategory: row.get("subcategory"),
        images: serde_json::from_str(&images_json).unwrap_or_default(),
        contact: ContactInfo {
            phone: row.get("contact_phone"),
            telegram: row.get("contact_telegram"),
        },
        location: row.get("location"),
        // corrupt status text keeps the row out of the public feed
        status: ListingStatus::from_str(&status_str).unwrap_or(ListingStatus::Archived),
        views: row.get::<i64, _>("views") as u32,
        created_at: parse_timestamp(row.get("created_at")),
        updated_at: parse_timestamp(row.get("updated_at")),
    }
}

fn parse_timestamp(raw: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl ListingStore for SqliteListingStore {
    async fn insert(&self, listing: &Listing) -> Result<i64, ListingError> {
        let images = serde_json::to_string(&listing.images)
            .map_err(|e| ListingError::StorageError(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO listings (
                author_id, title, description, price, listing_type, category,
                subcategory, images, contact_phone, contact_telegram, location,
                status, views, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(listing.author_id as i64)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.price)
        .bind(listing.listing_type.as_str())
        .bind(&listing.category)
        .bind(&listing.subcategory)
        .bind(&images)
        .bind(&listing.contact.phone)
        .bind(&listing.contact.telegram)
        .bind(&listing.location)
        .bind(listing.status.as_str())
        .bind(listing.views as i64)
        .bind(listing.created_at.to_rfc3339())
        .bind(listing.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| ListingError::StorageError(e.to_string()))?;

        Ok(result.last_insert_rowid())
    }

    async fn get(&self, id: i64) -> Result<Option<Listing>, ListingError> {
        let row = sqlx::query("SELECT * FROM listings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ListingError::StorageError(e.to_string()))?;

        Ok(row.as_ref().map(row_to_listing))
    }

    async fn update(&self, listing: &Listing) -> Result<(), ListingError> {
        let images = serde_json::to_string(&listing.images)
            .map_err(|e| ListingError::StorageError(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE listings SET
                title = ?, description = ?, price = ?, listing_type = ?,
                category = ?, subcategory = ?, images = ?, contact_phone = ?,
                contact_telegram = ?, location = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.price)
        .bind(listing.listing_type.as_str())
        .bind(&listing.category)
        .bind(&listing.subcategory)
        .bind(&images)
        .bind(&listing.contact.phone)
        .bind(&listing.contact.telegram)
        .bind(&listing.location)
        .bind(listing.status.as_str())
        .bind(listing.updated_at.to_rfc3339())
        .bind(listing.id)
        .execute(&self.pool)
        .await
        .map_err(|e| ListingError::StorageError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(ListingError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), ListingError> {
        sqlx::query("DELETE FROM listings WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ListingError::StorageError(e.to_string()))?;
        Ok(())
    }

    async fn by_author(&self, author_id: u64) -> Result<Vec<Listing>, ListingError> {
        let rows = sqlx::query(
            "SELECT * FROM listings WHERE author_id = ? ORDER BY created_at DESC",
        )
        .bind(author_id as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ListingError::StorageError(e.to_string()))?;

        Ok(rows.iter().map(row_to_listing).collect())
    }

    async fn browse(&self, query: &FeedQuery) -> Result<FeedPage, ListingError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) AS n FROM listings");
        push_filters(&mut count_qb, query);
        let total: i64 = count_qb
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ListingError::StorageError(e.to_string()))?
            .get("n");

        let mut qb = QueryBuilder::new("SELECT * FROM listings");
        push_filters(&mut qb, query);
        match query.sort {
            SortOrder::Newest => qb.push(" ORDER BY created_at DESC"),
            SortOrder::PriceAsc => qb.push(" ORDER BY price ASC, created_at DESC"),
            SortOrder::PriceDesc => qb.push(" ORDER BY price DESC, created_at DESC"),
        };
        qb.push(" LIMIT ").push_bind(query.per_page as i64);
        qb.push(" OFFSET ").push_bind(query.offset() as i64);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ListingError::StorageError(e.to_string()))?;

        Ok(FeedPage {
            items: rows.iter().map(row_to_listing).collect(),
            total: total as u32,
            page: query.page,
            per_page: query.per_page,
        })
    }

    async fn set_status(&self, id: i64, status: ListingStatus) -> Result<(), ListingError> {
        let result = sqlx::query("UPDATE listings SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ListingError::StorageError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(ListingError::NotFound);
        }
        Ok(())
    }

    async fn increment_views(&self, id: i64) -> Result<(), ListingError> {
        // missing rows are a silent no-op, matching the service contract
        sqlx::query("UPDATE listings SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ListingError::StorageError(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::sqlite::SqlitePoolOptions;

    // One connection: every :memory: connection is its own database.
    async fn store() -> SqliteListingStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteListingStore::new(pool);
        store.migrate().await.unwrap();
        store
    }

    fn listing(title: &str, price: f64, age_minutes: i64) -> Listing {
        let created = Utc::now() - Duration::minutes(age_minutes);
        Listing {
            id: 0,
            author_id: 1,
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
    async fn test_browse_excludes_non_active_rows() {
        let store = store().await;
        store.insert(&listing("Активне", 100.0, 0)).await.unwrap();

        let mut sold = listing("Продане", 100.0, 0);
        sold.status = ListingStatus::Sold;
        store.insert(&sold).await.unwrap();

        let mut archived = listing("Архівне", 100.0, 0);
        archived.status = ListingStatus::Archived;
        store.insert(&archived).await.unwrap();

        let page = store.browse(&FeedQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Активне");
    }

    #[tokio::test]
    async fn test_free_only_wins_over_listing_type() {
        let store = store().await;
        store.insert(&listing("Ноутбук", 7000.0, 0)).await.unwrap();

        let mut giveaway = listing("Віддам диван", 0.0, 0);
        giveaway.listing_type = ListingType::Free;
        store.insert(&giveaway).await.unwrap();

        // the giveaway tab sets both; free_only must take precedence
        let page = store
            .browse(&FeedQuery {
                free_only: true,
                listing_type: Some(ListingType::Sell),
                ..FeedQuery::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Віддам диван");
    }

    #[tokio::test]
    async fn test_price_band_filter() {
        let store = store().await;
        store.insert(&listing("Дешевше", 100.0, 0)).await.unwrap();
        store.insert(&listing("Середнє", 500.0, 0)).await.unwrap();
        store.insert(&listing("Дорожче", 900.0, 0)).await.unwrap();

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

    #[tokio::test]
    async fn test_search_hits_title_and_description() {
        let store = store().await;
        store.insert(&listing("Ноутбук Lenovo", 7000.0, 0)).await.unwrap();

        let mut by_description = listing("Телефон", 4000.0, 0);
        by_description.description = "Samsung Galaxy у гарному стані".to_string();
        store.insert(&by_description).await.unwrap();

        let page = store
            .browse(&FeedQuery {
                search: Some("lenovo".to_string()),
                ..FeedQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Ноутбук Lenovo");

        let page = store
            .browse(&FeedQuery {
                search: Some("Galaxy".to_string()),
                ..FeedQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Телефон");
    }

    #[tokio::test]
    async fn test_browse_paginates_and_counts() {
        let store = store().await;
        for i in 0..5 {
            store
                .insert(&listing(&format!("Оголошення {i}"), 100.0, i))
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

        // total reflects every match, not just this page
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.page, 2);
        // newest first: page 2 starts at the third-newest row
        assert_eq!(page.items[0].title, "Оголошення 2");
    }

    #[tokio::test]
    async fn test_sort_by_price() {
        let store = store().await;
        store.insert(&listing("Дорожче", 900.0, 0)).await.unwrap();
        store.insert(&listing("Дешевше", 100.0, 0)).await.unwrap();

        let page = store
            .browse(&FeedQuery {
                sort: SortOrder::PriceAsc,
                ..FeedQuery::default()
            })
            .await
            .unwrap();

        assert_eq!(page.items[0].price, 100.0);
        assert_eq!(page.items[1].price, 900.0);
    }
}
