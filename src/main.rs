// This is the entry point of the marketplace backend.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (databases, APIs)
// - `api/` = HTTP adapters for the Telegram Mini App (routes, auth, DTOs)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize storage and run migrations
// 3. Wire services together (dependency injection)
// 4. Serve the HTTP API

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "api/api_layer.rs"]
mod api;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use std::sync::Arc;

use anyhow::Context;

use crate::api::rest::{build_router, ApiConfig, AppState};
use crate::core::analytics::AnalyticsService;
use crate::core::comments::CommentService;
use crate::core::importer::ImportService;
use crate::core::listings::ListingService;
use crate::core::profiles::ProfileService;
use crate::infra::analytics::SqliteAnalyticsStore;
use crate::infra::comments::SqliteCommentStore;
use crate::infra::listings::SqliteListingStore;
use crate::infra::profiles::SqliteProfileStore;
use crate::infra::storage::ImageStore;
use crate::infra::telegram::TelegramNotifier;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (for local development)
    dotenv::dotenv().ok();

    // Initialize logging - RUST_LOG controls verbosity
    tracing_subscriber::fmt::init();

    let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok();
    let session_secret = std::env::var("SESSION_SECRET").unwrap_or_else(|_| {
        tracing::warn!("SESSION_SECRET not set, using an insecure development secret");
        "insecure-dev-secret".to_string()
    });
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let import_author_id = std::env::var("IMPORT_AUTHOR_ID")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let database_path = env_or("DATABASE_PATH", "marketplace.db");
    let upload_dir = env_or("UPLOAD_DIR", "uploads");
    let bind_addr = env_or("BIND_ADDR", "0.0.0.0:8080");

    // One SQLite file, one pool, shared by every store
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .connect(&format!("sqlite://{}?mode=rwc", database_path))
        .await
        .with_context(|| format!("failed to open database at {database_path}"))?;

    let listing_store = SqliteListingStore::new(pool.clone());
    listing_store
        .migrate()
        .await
        .map_err(|e| anyhow::anyhow!("listing migrations failed: {e}"))?;
    let comment_store = SqliteCommentStore::new(pool.clone());
    comment_store
        .migrate()
        .await
        .map_err(|e| anyhow::anyhow!("comment migrations failed: {e}"))?;
    let profile_store = SqliteProfileStore::new(pool.clone());
    profile_store
        .migrate()
        .await
        .map_err(|e| anyhow::anyhow!("profile migrations failed: {e}"))?;
    let analytics_store = SqliteAnalyticsStore::new(pool.clone());
    analytics_store
        .migrate()
        .await
        .map_err(|e| anyhow::anyhow!("analytics migrations failed: {e}"))?;

    // Services: core logic over the stores. The importer gets its own
    // ListingService so imported drafts go through the same validation
    // path as user submissions.
    let listings = Arc::new(ListingService::new(listing_store));
    let comments = Arc::new(CommentService::new(
        comment_store,
        TelegramNotifier::new(bot_token.clone()),
    ));
    let profiles = Arc::new(ProfileService::new(profile_store));
    let analytics = Arc::new(AnalyticsService::new(analytics_store));
    let importer = Arc::new(ImportService::new(ListingService::new(
        SqliteListingStore::new(pool.clone()),
    )));
    let images = Arc::new(ImageStore::new(&upload_dir));

    let state = AppState {
        listings,
        comments,
        profiles,
        analytics,
        importer,
        images,
        config: Arc::new(ApiConfig {
            bot_token,
            session_secret,
            admin_token,
            import_author_id,
            upload_dir,
        }),
    };

    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "marketplace backend listening");

    axum::serve(listener, router)
        .await
        .context("server exited with an error")?;

    Ok(())
}
