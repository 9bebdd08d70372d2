// Implementations for the listings feed.

pub mod in_memory;
pub mod sqlite_listing_store;

pub use sqlite_listing_store::SqliteListingStore;
