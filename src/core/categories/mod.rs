// Core categories module - the static catalog and filter definitions.

pub mod category_catalog;

pub use category_catalog::{Category, FilterDef, Subcategory, FALLBACK_CATEGORY};
