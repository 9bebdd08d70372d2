// Core moderation module - pure content screens for user-submitted text.
// No I/O anywhere in here; the listing and comment services call these
// before anything touches storage, and the api layer re-exposes them as
// an advisory pre-check for the Mini App.

pub mod blocklist;
pub mod gibberish;
pub mod lexical;
pub mod moderation_models;

pub use blocklist::{check_content, check_image_name};
pub use lexical::{
    has_emoji, validate_comment, validate_description, validate_price, validate_title,
};
pub use moderation_models::*;
