// Core listings module - classified ads and the feed query model.

pub mod listing_models;
pub mod listing_service;

pub use listing_models::*;
pub use listing_service::*;
