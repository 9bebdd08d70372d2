// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "listings/listing_stores.rs"]
pub mod listings;

#[path = "comments/sqlite_comment_store.rs"]
pub mod comments;

#[path = "profiles/sqlite_profile_store.rs"]
pub mod profiles;

#[path = "analytics/sqlite_analytics_store.rs"]
pub mod analytics;

#[path = "telegram/bot_api_client.rs"]
pub mod telegram;

#[path = "storage/image_store.rs"]
pub mod storage;
