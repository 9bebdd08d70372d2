// User profiles, keyed by Telegram user id.
//
// Profiles are born from verified init data on session creation; the
// only field a user edits directly is the contact phone. The public
// view strips everything a stranger should not see.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::i18n::Lang;

/// The user payload inside Telegram WebApp init data.
#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    pub id: u64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub lang: Lang,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl Profile {
    /// What other users see on a seller card.
    pub fn public_view(&self, active_listings: u32) -> PublicProfile {
        PublicProfile {
            user_id: self.user_id,
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            active_listings,
            member_since: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub user_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub first_name: String,
    pub active_listings: u32,
    pub member_since: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile not found")]
    NotFound,

    #[error("phone number doesn't look valid")]
    InvalidPhone,

    #[error("storage error: {0}")]
    StorageError(String),
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert or fully replace a profile row.
    async fn upsert(&self, profile: &Profile) -> Result<(), ProfileError>;

    async fn get(&self, user_id: u64) -> Result<Option<Profile>, ProfileError>;
}

pub struct ProfileService<S: ProfileStore> {
    store: S,
}

impl<S: ProfileStore> ProfileService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Sync a profile from verified Telegram user data.
    ///
    /// Names, username and language follow Telegram on every login; the
    /// phone and the original created_at survive updates.
    pub async fn upsert_from_telegram(&self, tg: TgUser) -> Result<Profile, ProfileError> {
        let now = Utc::now();
        let lang = tg
            .language_code
            .as_deref()
            .map(Lang::from_code_or_default)
            .unwrap_or_default();

        let profile = match self.store.get(tg.id).await? {
            Some(existing) => Profile {
                user_id: existing.user_id,
                username: tg.username,
                first_name: tg.first_name,
                last_name: tg.last_name,
                phone: existing.phone,
                lang,
                created_at: existing.created_at,
                last_seen_at: now,
            },
            None => Profile {
                user_id: tg.id,
                username: tg.username,
                first_name: tg.first_name,
                last_name: tg.last_name,
                phone: None,
                lang,
                created_at: now,
                last_seen_at: now,
            },
        };

        self.store.upsert(&profile).await?;
        Ok(profile)
    }

    pub async fn get(&self, user_id: u64) -> Result<Profile, ProfileError> {
        self.store.get(user_id).await?.ok_or(ProfileError::NotFound)
    }

    /// Set or clear the contact phone. Accepts digits with the usual
    /// separators, normalizes to `+?digits`.
    pub async fn set_phone(
        &self,
        user_id: u64,
        phone: Option<&str>,
    ) -> Result<Profile, ProfileError> {
        let normalized = match phone {
            None => None,
            Some(raw) => Some(normalize_phone(raw).ok_or(ProfileError::InvalidPhone)?),
        };

        let mut profile = self.get(user_id).await?;
        profile.phone = normalized;
        self.store.upsert(&profile).await?;
        Ok(profile)
    }
}

/// Strip formatting and sanity-check the digit count. This is a shape
/// check, not carrier validation.
fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let plus = trimmed.starts_with('+');
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();

    let ok_chars = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
    if !ok_chars {
        return None;
    }

    if digits.len() < 10 || digits.len() > 15 {
        return None;
    }

    Some(if plus {
        format!("+{digits}")
    } else {
        digits
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;

    struct MockProfileStore {
        rows: DashMap<u64, Profile>,
    }

    impl MockProfileStore {
        fn new() -> Self {
            Self {
                rows: DashMap::new(),
            }
        }
    }

    #[async_trait]
    impl ProfileStore for MockProfileStore {
        async fn upsert(&self, profile: &Profile) -> Result<(), ProfileError> {
            self.rows.insert(profile.user_id, profile.clone());
            Ok(())
        }

        async fn get(&self, user_id: u64) -> Result<Option<Profile>, ProfileError> {
            Ok(self.rows.get(&user_id).map(|r| r.clone()))
        }
    }

    fn tg_user(id: u64) -> TgUser {
        TgUser {
            id,
            first_name: "Олена".to_string(),
            last_name: None,
            username: Some("olena_k".to_string()),
            language_code: Some("uk-UA".to_string()),
        }
    }

    #[tokio::test]
    async fn test_first_login_creates_profile() {
        let service = ProfileService::new(MockProfileStore::new());

        let profile = service.upsert_from_telegram(tg_user(42)).await.unwrap();

        assert_eq!(profile.user_id, 42);
        assert_eq!(profile.lang, Lang::Uk);
        assert!(profile.phone.is_none());
    }

    #[tokio::test]
    async fn test_relogin_preserves_phone_and_created_at() {
        let service = ProfileService::new(MockProfileStore::new());

        let first = service.upsert_from_telegram(tg_user(42)).await.unwrap();
        service
            .set_phone(42, Some("+380 97 123 45 67"))
            .await
            .unwrap();

        let mut updated = tg_user(42);
        updated.username = Some("olena_new".to_string());
        updated.language_code = Some("en".to_string());
        let second = service.upsert_from_telegram(updated).await.unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.phone.as_deref(), Some("+380971234567"));
        assert_eq!(second.username.as_deref(), Some("olena_new"));
        assert_eq!(second.lang, Lang::En);
    }

    #[tokio::test]
    async fn test_set_phone_validates_shape() {
        let service = ProfileService::new(MockProfileStore::new());
        service.upsert_from_telegram(tg_user(42)).await.unwrap();

        let err = service.set_phone(42, Some("not a phone")).await.unwrap_err();
        assert!(matches!(err, ProfileError::InvalidPhone));

        let err = service.set_phone(42, Some("12345")).await.unwrap_err();
        assert!(matches!(err, ProfileError::InvalidPhone));

        let profile = service.set_phone(42, Some("097-123-45-67")).await.unwrap();
        assert_eq!(profile.phone.as_deref(), Some("0971234567"));

        let profile = service.set_phone(42, None).await.unwrap();
        assert!(profile.phone.is_none());
    }

    #[tokio::test]
    async fn test_public_view_hides_phone() {
        let service = ProfileService::new(MockProfileStore::new());
        service.upsert_from_telegram(tg_user(42)).await.unwrap();
        let profile = service
            .set_phone(42, Some("+380971234567"))
            .await
            .unwrap();

        let public = profile.public_view(3);
        assert_eq!(public.active_listings, 3);
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("phone").is_none());
        assert_eq!(json["activeListings"], 3);
    }

    #[tokio::test]
    async fn test_unknown_language_falls_back() {
        let service = ProfileService::new(MockProfileStore::new());
        let mut tg = tg_user(42);
        tg.language_code = Some("de".to_string());

        let profile = service.upsert_from_telegram(tg).await.unwrap();
        assert_eq!(profile.lang, Lang::Uk);
    }
}
