// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "listings/mod.rs"]
pub mod listings;

#[path = "categories/mod.rs"]
pub mod categories;

#[path = "comments/comment_service.rs"]
pub mod comments;

#[path = "profiles/profile_service.rs"]
pub mod profiles;

#[path = "analytics/analytics_service.rs"]
pub mod analytics;

#[path = "i18n/message_catalog.rs"]
pub mod i18n;

#[path = "importer/channel_importer.rs"]
pub mod importer;

#[path = "notifications/notifier.rs"]
pub mod notifications;
