// Listing domain models - the records and query shapes for the classifieds feed.
//
// Everything here serializes camelCase because these structs go to the
// Mini App as-is. Keep them free of storage concerns; the infra layer
// maps them to rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hard cap on images per listing.
pub const MAX_LISTING_IMAGES: usize = 5;

/// Feed page size when the client does not ask for one.
pub const FEED_PER_PAGE_DEFAULT: u32 = 20;

/// Upper bound on page size, whatever the client asks for.
pub const FEED_PER_PAGE_MAX: u32 = 50;

/// What kind of deal a listing is. Drives the price rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Sell,
    Buy,
    Service,
    Free,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Sell => "sell",
            ListingType::Buy => "buy",
            ListingType::Service => "service",
            ListingType::Free => "free",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "sell" => Some(ListingType::Sell),
            "buy" => Some(ListingType::Buy),
            "service" => Some(ListingType::Service),
            "free" => Some(ListingType::Free),
            _ => None,
        }
    }
}

impl std::fmt::Display for ListingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state. Only Active listings show up in the public feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Sold,
    Archived,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Sold => "sold",
            ListingStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ListingStatus::Active),
            "sold" => Some(ListingStatus::Sold),
            "archived" => Some(ListingStatus::Archived),
            _ => None,
        }
    }
}

/// How a buyer reaches the seller. Both fields optional; the Mini App
/// shows whatever is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Telegram @username, stored without the @.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
}

impl ContactInfo {
    pub fn is_empty(&self) -> bool {
        self.phone.is_none() && self.telegram.is_none()
    }
}

/// A marketplace classified ad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: i64,
    /// Telegram user id of the seller.
    pub author_id: u64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub listing_type: ListingType,
    /// Category slug from the static catalog.
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Stored image paths, at most MAX_LISTING_IMAGES.
    pub images: Vec<String>,
    pub contact: ContactInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub status: ListingStatus,
    pub views: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client payload for creating or fully replacing a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub listing_type: ListingType,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub location: Option<String>,
}

/// Feed ordering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

/// The feed filter set, deserialized straight from query params.
///
/// `normalized()` must run before the query reaches a store: it clamps
/// the page size and floors the page number, so stores can trust the
/// values they get.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub listing_type: Option<ListingType>,
    /// Shortcut filter for the "giveaway" tab.
    #[serde(default)]
    pub free_only: bool,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    FEED_PER_PAGE_DEFAULT
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            subcategory: None,
            listing_type: None,
            free_only: false,
            min_price: None,
            max_price: None,
            sort: SortOrder::default(),
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl FeedQuery {
    /// Clamp paging to sane bounds.
    pub fn normalized(mut self) -> Self {
        if self.page == 0 {
            self.page = 1;
        }
        if self.per_page == 0 {
            self.per_page = FEED_PER_PAGE_DEFAULT;
        }
        if self.per_page > FEED_PER_PAGE_MAX {
            self.per_page = FEED_PER_PAGE_MAX;
        }
        self
    }

    /// Row offset for the current page. Call on a normalized query.
    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.per_page
    }
}

/// One page of feed results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub items: Vec<Listing>,
    pub total: u32,
    pub page: u32,
    pub per_page: u32,
}
