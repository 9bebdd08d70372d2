// SQLite-backed profile store.
//
// Tables:
// - profiles: one row per Telegram user

use crate::core::i18n::Lang;
use crate::core::profiles::{Profile, ProfileError, ProfileStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteProfileStore {
    pool: Pool<Sqlite>,
}

impl SqliteProfileStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), ProfileError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id INTEGER PRIMARY KEY,
                username TEXT,
                first_name TEXT NOT NULL,
                last_name TEXT,
                phone TEXT,
                lang TEXT NOT NULL DEFAULT 'uk',
                created_at TEXT NOT NULL,
                last_seen_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ProfileError::StorageError(e.to_string()))?;

        Ok(())
    }
}

fn parse_timestamp(raw: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn upsert(&self, profile: &Profile) -> Result<(), ProfileError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (
                user_id, username, first_name, last_name, phone, lang,
                created_at, last_seen_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                username = excluded.username,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                phone = excluded.phone,
                lang = excluded.lang,
                last_seen_at = excluded.last_seen_at
            "#,
        )
        .bind(profile.user_id as i64)
        .bind(&profile.username)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone)
        .bind(profile.lang.as_str())
        .bind(profile.created_at.to_rfc3339())
        .bind(profile.last_seen_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| ProfileError::StorageError(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, user_id: u64) -> Result<Option<Profile>, ProfileError> {
        let row = sqlx::query("SELECT * FROM profiles WHERE user_id = ?")
            .bind(user_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ProfileError::StorageError(e.to_string()))?;

        Ok(row.map(|row| {
            let lang_str: String = row.get("lang");
            Profile {
                user_id: row.get::<i64, _>("user_id") as u64,
                username: row.get("username"),
                first_name: row.get("first_name"),
                last_name: row.get("last_name"),
                phone: row.get("phone"),
                lang: Lang::from_code_or_default(&lang_str),
                created_at: parse_timestamp(row.get("created_at")),
                last_seen_at: parse_timestamp(row.get("last_seen_at")),
            }
        }))
    }
}
