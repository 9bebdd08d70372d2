// SQLite-backed comment store.
//
// Tables:
// - comments: one row per comment, ordered by insertion within a listing

use crate::core::comments::{Comment, CommentError, CommentStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteCommentStore {
    pool: Pool<Sqlite>,
}

impl SqliteCommentStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), CommentError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                listing_id INTEGER NOT NULL,
                author_id INTEGER NOT NULL,
                author_name TEXT NOT NULL,
                text TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_comments_listing
                ON comments(listing_id, id);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| CommentError::StorageError(e.to_string()))?;

        Ok(())
    }
}

fn row_to_comment(row: &SqliteRow) -> Comment {
    let created_str: String = row.get("created_at");
    Comment {
        id: row.get("id"),
        listing_id: row.get("listing_id"),
        author_id: row.get::<i64, _>("author_id") as u64,
        author_name: row.get("author_name"),
        text: row.get("text"),
        created_at: DateTime::parse_from_rfc3339(&created_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    }
}

#[async_trait]
impl CommentStore for SqliteCommentStore {
    async fn insert(&self, comment: &Comment) -> Result<i64, CommentError> {
        let result = sqlx::query(
            r#"
            INSERT INTO comments (listing_id, author_id, author_name, text, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(comment.listing_id)
        .bind(comment.author_id as i64)
        .bind(&comment.author_name)
        .bind(&comment.text)
        .bind(comment.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| CommentError::StorageError(e.to_string()))?;

        Ok(result.last_insert_rowid())
    }

    async fn get(&self, id: i64) -> Result<Option<Comment>, CommentError> {
        let row = sqlx::query("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CommentError::StorageError(e.to_string()))?;

        Ok(row.as_ref().map(row_to_comment))
    }

    async fn list(
        &self,
        listing_id: i64,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Comment>, CommentError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM comments
            WHERE listing_id = ?
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(listing_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CommentError::StorageError(e.to_string()))?;

        Ok(rows.iter().map(row_to_comment).collect())
    }

    async fn delete(&self, id: i64) -> Result<(), CommentError> {
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| CommentError::StorageError(e.to_string()))?;
        Ok(())
    }
}
