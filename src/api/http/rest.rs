// HTTP surface for the Mini App.
//
// Thin translation layer: DTOs in, core service calls, DTOs out. No
// business rules live here. Every error becomes the uniform
// `{error, message}` envelope; moderation rejections additionally carry
// the stable reason key and a localized message so the client can show
// the right text without its own lookup table.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Json, Path, Query, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::api::auth::{self, AuthError};
use crate::core::analytics::AnalyticsService;
use crate::core::categories::category_catalog;
use crate::core::comments::{CommentError, CommentService};
use crate::core::i18n::{self, Lang};
use crate::core::importer::{ChannelPost, ImportReport, ImportService};
use crate::core::listings::{
    FeedPage, FeedQuery, Listing, ListingError, ListingService, ListingStatus, ListingType,
    NewListing, MAX_LISTING_IMAGES,
};
use crate::core::moderation::{self, Verdict, VerdictParams};
use crate::core::profiles::{Profile, ProfileError, ProfileService};
use crate::infra::analytics::SqliteAnalyticsStore;
use crate::infra::comments::SqliteCommentStore;
use crate::infra::listings::SqliteListingStore;
use crate::infra::profiles::SqliteProfileStore;
use crate::infra::storage::{ImageError, ImageStore};
use crate::infra::telegram::TelegramNotifier;

// =============================================================================
// State & configuration
// =============================================================================

/// Values the composition root reads from the environment.
pub struct ApiConfig {
    /// Required for init-data verification; None disables /api/auth/session.
    pub bot_token: Option<String>,
    pub session_secret: String,
    /// None disables the admin import endpoint.
    pub admin_token: Option<String>,
    /// Owner of imported listings.
    pub import_author_id: u64,
    /// Where uploaded images land, served under /uploads.
    pub upload_dir: String,
}

#[derive(Clone)]
pub struct AppState {
    pub listings: Arc<ListingService<SqliteListingStore>>,
    pub comments: Arc<CommentService<SqliteCommentStore, TelegramNotifier>>,
    pub profiles: Arc<ProfileService<SqliteProfileStore>>,
    pub analytics: Arc<AnalyticsService<SqliteAnalyticsStore>>,
    pub importer: Arc<ImportService<SqliteListingStore>>,
    pub images: Arc<ImageStore>,
    pub config: Arc<ApiConfig>,
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .route("/api/auth/session", post(create_session))
        .route("/api/feed", get(browse_feed))
        .route("/api/listings", post(create_listing))
        .route("/api/listings/:id", get(get_listing))
        .route("/api/listings/:id", put(update_listing))
        .route("/api/listings/:id", delete(delete_listing))
        .route("/api/listings/:id/status", post(set_listing_status))
        .route("/api/listings/:id/stats", get(listing_stats))
        .route("/api/listings/:id/comments", get(list_comments))
        .route("/api/listings/:id/comments", post(add_comment))
        .route("/api/comments/:id", delete(delete_comment))
        .route("/api/my/listings", get(my_listings))
        .route("/api/profiles/me", get(my_profile))
        .route("/api/profiles/me", put(update_my_profile))
        .route("/api/profiles/:id", get(public_profile))
        .route("/api/categories", get(list_categories))
        .route("/api/moderation/check", post(moderation_check))
        .route("/api/admin/import", post(admin_import))
        .route("/api/admin/searches", get(admin_top_searches))
        .route("/health", get(health_check))
        .nest_service("/uploads", uploads)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Error envelope
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    pub error: String,
    pub message: String,
    /// Moderation reason key, set on 422 validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<VerdictParams>,
}

pub struct ApiError {
    status: StatusCode,
    body: ApiErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody {
                error: error.to_string(),
                message: message.into(),
                error_key: None,
                params: None,
            },
        }
    }

    /// A 422 carrying the verdict's reason key and localized message.
    fn from_verdict(lang: Lang, verdict: Verdict) -> Self {
        let message = i18n::render(lang, &verdict).unwrap_or_else(|| "invalid content".to_string());
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: ApiErrorBody {
                error: "validation_failed".to_string(),
                message,
                error_key: verdict.reason.map(|r| r.as_key().to_string()),
                params: verdict.params,
            },
        }
    }

    fn from_listing_error(lang: Lang, err: ListingError) -> Self {
        match err {
            ListingError::Rejected(verdict) => Self::from_verdict(lang, verdict),
            ListingError::NotFound => {
                Self::new(StatusCode::NOT_FOUND, "not_found", "listing not found")
            }
            ListingError::NotOwner => Self::new(
                StatusCode::FORBIDDEN,
                "not_owner",
                "only the author can modify a listing",
            ),
            ListingError::UnknownCategory(slug) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "unknown_category",
                format!("unknown category: {slug}"),
            ),
            ListingError::TooManyImages(limit) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "too_many_images",
                format!("at most {limit} images per listing"),
            ),
            ListingError::StorageError(e) => {
                error!(error = %e, "listing storage error");
                Self::internal()
            }
        }
    }

    fn from_comment_error(lang: Lang, err: CommentError) -> Self {
        match err {
            CommentError::Rejected(verdict) => Self::from_verdict(lang, verdict),
            CommentError::NotFound => {
                Self::new(StatusCode::NOT_FOUND, "not_found", "comment not found")
            }
            CommentError::ListingNotOpen => Self::new(
                StatusCode::CONFLICT,
                "listing_not_open",
                "this listing is not open for comments",
            ),
            CommentError::NotAllowed => Self::new(
                StatusCode::FORBIDDEN,
                "not_allowed",
                "not allowed to delete this comment",
            ),
            CommentError::StorageError(e) => {
                error!(error = %e, "comment storage error");
                Self::internal()
            }
        }
    }

    fn from_profile_error(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound => {
                Self::new(StatusCode::NOT_FOUND, "not_found", "profile not found")
            }
            ProfileError::InvalidPhone => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_phone",
                "phone number doesn't look valid",
            ),
            ProfileError::StorageError(e) => {
                error!(error = %e, "profile storage error");
                Self::internal()
            }
        }
    }

    fn from_image_error(err: ImageError) -> Self {
        match err {
            ImageError::StorageError(e) => {
                error!(error = %e, "image storage error");
                Self::internal()
            }
            other => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "bad_image",
                other.to_string(),
            ),
        }
    }

    fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid session token",
        )
    }

    fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "something went wrong",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// =============================================================================
// Extractors
// =============================================================================

/// An authenticated user, pulled from the Bearer session token.
pub struct AuthedUser(pub u64);

#[async_trait]
impl FromRequestParts<AppState> for AuthedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = bearer_user(&parts.headers, state).ok_or_else(ApiError::unauthorized)?;
        Ok(AuthedUser(user_id))
    }
}

/// Like AuthedUser but tolerant: anonymous requests come through as None.
/// Used where a user id only enriches analytics.
pub struct MaybeUser(pub Option<u64>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(bearer_user(&parts.headers, state)))
    }
}

fn bearer_user(headers: &HeaderMap, state: &AppState) -> Option<u64> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    auth::verify_session(&state.config.session_secret, token).ok()
}

#[derive(Debug, Default, Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

impl LangQuery {
    fn resolve(&self) -> Lang {
        self.lang
            .as_deref()
            .map(Lang::from_code_or_default)
            .unwrap_or_default()
    }
}

/// Language for an authenticated request: explicit query param wins,
/// then the stored profile language, then the default.
async fn lang_for_user(state: &AppState, query: &LangQuery, user_id: u64) -> Lang {
    if let Some(code) = query.lang.as_deref() {
        if let Some(lang) = Lang::from_code(code) {
            return lang;
        }
    }
    match state.profiles.get(user_id).await {
        Ok(profile) => profile.lang,
        Err(_) => Lang::default(),
    }
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRequest {
    init_data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    token: String,
    profile: Profile,
}

async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Some(bot_token) = state.config.bot_token.as_deref() else {
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "auth_unavailable",
            "authentication is not configured",
        ));
    };

    let tg_user = auth::verify_init_data(bot_token, &request.init_data).map_err(|e| match e {
        AuthError::Expired => ApiError::new(
            StatusCode::UNAUTHORIZED,
            "init_data_expired",
            "init data is too old, reopen the app",
        ),
        _ => ApiError::new(
            StatusCode::UNAUTHORIZED,
            "bad_init_data",
            "init data verification failed",
        ),
    })?;

    let profile = state
        .profiles
        .upsert_from_telegram(tg_user)
        .await
        .map_err(ApiError::from_profile_error)?;

    let token = auth::issue_session(&state.config.session_secret, profile.user_id)
        .map_err(|_| ApiError::internal())?;

    info!(user_id = profile.user_id, "session created");
    Ok(Json(SessionResponse { token, profile }))
}

// =============================================================================
// Feed & listings
// =============================================================================

async fn browse_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedPage>, ApiError> {
    let search = query.search.clone();
    let page = state
        .listings
        .browse(query)
        .await
        .map_err(|e| ApiError::from_listing_error(Lang::default(), e))?;

    if let Some(search) = search {
        if let Err(e) = state.analytics.record_search(&search, page.total).await {
            warn!(error = %e, "failed to record search");
        }
    }

    Ok(Json(page))
}

async fn get_listing(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<Listing>, ApiError> {
    let listing = state
        .listings
        .get(id)
        .await
        .map_err(|e| ApiError::from_listing_error(Lang::default(), e))?;

    if let Err(e) = state.listings.record_view(id).await {
        warn!(listing_id = id, error = %e, "failed to bump view counter");
    }
    if let Err(e) = state.analytics.record_listing_view(id, viewer).await {
        warn!(listing_id = id, error = %e, "failed to record view event");
    }

    Ok(Json(listing))
}

/// Create payload: listing fields plus raw base64 image payloads, which
/// become stored file names before the core service ever sees them.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateListingRequest {
    #[serde(flatten)]
    listing: NewListing,
    #[serde(default)]
    image_data: Vec<String>,
}

/// Stored image names carry the owner's id prefix
/// (`{owner_id}_{stamp}.{ext}`, see ImageStore::save_base64). A name a
/// client hands back on update must carry the caller's own prefix;
/// anything else is someone else's file and must never end up on a
/// listing the caller can later delete.
fn image_owned_by(user_id: u64, name: &str) -> bool {
    name.strip_prefix(&format!("{user_id}_"))
        .is_some_and(|rest| !rest.is_empty())
}

async fn store_images(
    state: &AppState,
    owner_id: u64,
    payloads: &[String],
) -> Result<Vec<String>, ApiError> {
    if payloads.len() > MAX_LISTING_IMAGES {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "too_many_images",
            format!("at most {MAX_LISTING_IMAGES} images per listing"),
        ));
    }
    let mut names = Vec::with_capacity(payloads.len());
    for payload in payloads {
        let name = state
            .images
            .save_base64(owner_id, payload)
            .await
            .map_err(ApiError::from_image_error)?;
        names.push(name);
    }
    Ok(names)
}

async fn create_listing(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    Query(lang_query): Query<LangQuery>,
    Json(request): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<Listing>), ApiError> {
    let lang = lang_for_user(&state, &lang_query, user_id).await;

    let mut new = request.listing;
    new.images = store_images(&state, user_id, &request.image_data).await?;
    let stored = new.images.clone();

    match state.listings.create(user_id, new).await {
        Ok(listing) => {
            info!(listing_id = listing.id, user_id, "listing created");
            Ok((StatusCode::CREATED, Json(listing)))
        }
        Err(e) => {
            // a rejected draft must not leave orphan files behind
            for name in &stored {
                if let Err(cleanup) = state.images.remove(name).await {
                    warn!(image = %name, error = %cleanup, "failed to clean up image");
                }
            }
            Err(ApiError::from_listing_error(lang, e))
        }
    }
}

async fn update_listing(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    Query(lang_query): Query<LangQuery>,
    Path(id): Path<i64>,
    Json(request): Json<CreateListingRequest>,
) -> Result<Json<Listing>, ApiError> {
    let lang = lang_for_user(&state, &lang_query, user_id).await;

    let mut new = request.listing;
    if let Some(name) = new.images.iter().find(|n| !image_owned_by(user_id, n)) {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "not_owner",
            format!("image {name} does not belong to this user"),
        ));
    }
    if !request.image_data.is_empty() {
        let mut names = store_images(&state, user_id, &request.image_data).await?;
        new.images.append(&mut names);
        if new.images.len() > MAX_LISTING_IMAGES {
            return Err(ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "too_many_images",
                format!("at most {MAX_LISTING_IMAGES} images per listing"),
            ));
        }
    }

    let listing = state
        .listings
        .update(id, user_id, new)
        .await
        .map_err(|e| ApiError::from_listing_error(lang, e))?;
    Ok(Json(listing))
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    status: ListingStatus,
}

async fn set_listing_status(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    Path(id): Path<i64>,
    Json(request): Json<StatusRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .listings
        .set_status(id, user_id, request.status)
        .await
        .map_err(|e| ApiError::from_listing_error(Lang::default(), e))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_listing(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    // grab the image names first; the row is gone after delete
    let images = match state.listings.get(id).await {
        Ok(listing) => listing.images,
        Err(_) => Vec::new(),
    };

    state
        .listings
        .delete(id, user_id)
        .await
        .map_err(|e| ApiError::from_listing_error(Lang::default(), e))?;

    for name in images {
        if let Err(e) = state.images.remove(&name).await {
            warn!(image = %name, error = %e, "failed to remove listing image");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn my_listings(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
) -> Result<Json<Vec<Listing>>, ApiError> {
    let listings = state
        .listings
        .my_listings(user_id)
        .await
        .map_err(|e| ApiError::from_listing_error(Lang::default(), e))?;
    Ok(Json(listings))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListingStatsResponse {
    listing_id: i64,
    views: u64,
}

async fn listing_stats(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ListingStatsResponse>, ApiError> {
    // 404 for listings that never existed, stats otherwise
    state
        .listings
        .get(id)
        .await
        .map_err(|e| ApiError::from_listing_error(Lang::default(), e))?;

    let views = state.analytics.listing_views(id).await.map_err(|e| {
        error!(listing_id = id, error = %e, "failed to read view stats");
        ApiError::internal()
    })?;

    Ok(Json(ListingStatsResponse {
        listing_id: id,
        views,
    }))
}

// =============================================================================
// Comments
// =============================================================================

#[derive(Debug, Deserialize)]
struct CommentsPageQuery {
    #[serde(default = "default_comments_limit")]
    limit: u32,
    #[serde(default)]
    offset: u32,
}

fn default_comments_limit() -> u32 {
    50
}

async fn list_comments(
    State(state): State<AppState>,
    Path(listing_id): Path<i64>,
    Query(page): Query<CommentsPageQuery>,
) -> Result<Json<Vec<crate::core::comments::Comment>>, ApiError> {
    let comments = state
        .comments
        .list(listing_id, page.limit, page.offset)
        .await
        .map_err(|e| ApiError::from_comment_error(Lang::default(), e))?;
    Ok(Json(comments))
}

#[derive(Debug, Deserialize)]
struct AddCommentRequest {
    text: String,
}

async fn add_comment(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    Query(lang_query): Query<LangQuery>,
    Path(listing_id): Path<i64>,
    Json(request): Json<AddCommentRequest>,
) -> Result<(StatusCode, Json<crate::core::comments::Comment>), ApiError> {
    let lang = lang_for_user(&state, &lang_query, user_id).await;

    let listing = state
        .listings
        .get(listing_id)
        .await
        .map_err(|e| ApiError::from_listing_error(lang, e))?;

    let author_name = match state.profiles.get(user_id).await {
        Ok(profile) => profile.first_name,
        Err(_) => "User".to_string(),
    };

    let comment = state
        .comments
        .add(&listing, user_id, &author_name, &request.text)
        .await
        .map_err(|e| ApiError::from_comment_error(lang, e))?;

    Ok((StatusCode::CREATED, Json(comment)))
}

async fn delete_comment(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    Path(comment_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let comment = state
        .comments
        .get(comment_id)
        .await
        .map_err(|e| ApiError::from_comment_error(Lang::default(), e))?;

    // listing owners may moderate their own threads; if the listing is
    // already gone, only the comment author remains eligible
    let listing_author_id = match state.listings.get(comment.listing_id).await {
        Ok(listing) => listing.author_id,
        Err(_) => 0,
    };

    state
        .comments
        .delete(comment_id, user_id, listing_author_id)
        .await
        .map_err(|e| ApiError::from_comment_error(Lang::default(), e))?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Profiles
// =============================================================================

async fn my_profile(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
) -> Result<Json<Profile>, ApiError> {
    let profile = state
        .profiles
        .get(user_id)
        .await
        .map_err(ApiError::from_profile_error)?;
    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
struct UpdateProfileRequest {
    /// Null clears the stored phone.
    phone: Option<String>,
}

async fn update_my_profile(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    let profile = state
        .profiles
        .set_phone(user_id, request.phone.as_deref())
        .await
        .map_err(ApiError::from_profile_error)?;
    Ok(Json(profile))
}

/// Seller card: public profile fields plus how many listings the seller
/// currently has open.
async fn public_profile(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
) -> Result<Json<crate::core::profiles::PublicProfile>, ApiError> {
    let profile = state
        .profiles
        .get(user_id)
        .await
        .map_err(ApiError::from_profile_error)?;

    let active = state
        .listings
        .my_listings(user_id)
        .await
        .map_err(|e| ApiError::from_listing_error(Lang::default(), e))?
        .iter()
        .filter(|l| l.status == ListingStatus::Active)
        .count() as u32;

    Ok(Json(profile.public_view(active)))
}

// =============================================================================
// Categories
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubcategoryDto {
    slug: &'static str,
    name: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoryDto {
    slug: &'static str,
    emoji: &'static str,
    name: &'static str,
    subcategories: Vec<SubcategoryDto>,
    filters: &'static [category_catalog::FilterDef],
}

async fn list_categories(Query(lang_query): Query<LangQuery>) -> Json<Vec<CategoryDto>> {
    let lang = lang_query.resolve();
    let categories = category_catalog::all()
        .iter()
        .map(|c| CategoryDto {
            slug: c.slug,
            emoji: c.emoji,
            name: c.name_for(lang),
            subcategories: c
                .subcategories
                .iter()
                .map(|s| SubcategoryDto {
                    slug: s.slug,
                    name: s.name_for(lang),
                })
                .collect(),
            filters: c.filters,
        })
        .collect();
    Json(categories)
}

// =============================================================================
// Moderation pre-check
// =============================================================================

/// Advisory pre-check payload. Clients send whichever fields their form
/// has; absent fields are skipped. The same validators run again on the
/// actual create/update, so this endpoint is a UX courtesy, not the gate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModerationCheckRequest {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    listing_type: Option<ListingType>,
    #[serde(default)]
    comment: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckedVerdict {
    #[serde(flatten)]
    verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct ModerationCheckResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<CheckedVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<CheckedVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<CheckedVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<CheckedVerdict>,
}

fn checked(lang: Lang, verdict: Verdict) -> CheckedVerdict {
    let message = i18n::render(lang, &verdict);
    CheckedVerdict { verdict, message }
}

async fn moderation_check(
    Query(lang_query): Query<LangQuery>,
    Json(request): Json<ModerationCheckRequest>,
) -> Json<ModerationCheckResponse> {
    let lang = lang_query.resolve();
    let mut response = ModerationCheckResponse::default();

    if let Some(title) = &request.title {
        response.title = Some(checked(lang, moderation::validate_title(title)));
    }
    if let Some(description) = &request.description {
        response.description = Some(checked(
            lang,
            moderation::validate_description(description),
        ));
    }
    if let Some(price) = request.price {
        let listing_type = request.listing_type.unwrap_or(ListingType::Sell);
        response.price = Some(checked(lang, moderation::validate_price(price, listing_type)));
    }
    if let Some(comment) = &request.comment {
        response.comment = Some(checked(lang, moderation::validate_comment(comment)));
    }

    Json(response)
}

// =============================================================================
// Admin import
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportRequest {
    channel: String,
    posts: Vec<ChannelPost>,
}

/// Gate for the /api/admin routes: the X-Admin-Token header must match
/// the configured token. No token configured means the routes are off.
fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "admin_unavailable",
            "admin endpoints are not configured",
        ));
    };

    let provided = headers
        .get("x-admin-token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if provided != expected {
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "bad admin token",
        ));
    }
    Ok(())
}

async fn admin_import(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ImportRequest>,
) -> Result<Json<ImportReport>, ApiError> {
    require_admin(&state, &headers)?;

    debug!(
        channel = %request.channel,
        posts = request.posts.len(),
        "running channel import"
    );

    let report = state
        .importer
        .run(
            state.config.import_author_id,
            &request.channel,
            &request.posts,
        )
        .await
        .map_err(|e| ApiError::from_listing_error(Lang::default(), e))?;

    info!(
        channel = %request.channel,
        imported = report.imported,
        skipped = report.skipped.len(),
        "channel import finished"
    );
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
struct TopSearchesQuery {
    #[serde(default = "default_top_searches_limit")]
    limit: u32,
}

fn default_top_searches_limit() -> u32 {
    20
}

async fn admin_top_searches(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TopSearchesQuery>,
) -> Result<Json<Vec<crate::core::analytics::SearchStat>>, ApiError> {
    require_admin(&state, &headers)?;

    let stats = state.analytics.top_searches(query.limit).await.map_err(|e| {
        error!(error = %e, "failed to read search stats");
        ApiError::internal()
    })?;
    Ok(Json(stats))
}

// =============================================================================
// Health
// =============================================================================

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
