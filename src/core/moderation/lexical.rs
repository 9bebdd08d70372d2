// Lexical validators - structural rules for user-submitted text.
//
// One entry point per field (title, description, price, comment). Each
// returns a Verdict and never panics on weird input. Rules run in a fixed
// order and stop at the first failure, so every verdict names exactly one
// violated rule.
//
// All length checks count chars, not bytes. Cyrillic input is the common
// case here and byte counts would roughly double its apparent length.

use std::collections::HashMap;

use super::blocklist;
use super::gibberish;
use super::moderation_models::{ReasonCode, Verdict};
use crate::core::listings::listing_models::ListingType;

// ===== TITLE RULES =====

const TITLE_MIN_CHARS: usize = 5;
const TITLE_MAX_CHARS: usize = 100;
const TITLE_REPEAT_RUN: usize = 5;
const TITLE_DIGIT_RATIO_MAX: f64 = 0.6;
const TITLE_MIN_LETTERS: usize = 2;
/// Flood rule applies to titles longer than this.
const TITLE_FLOOD_MIN_CHARS: usize = 5;
const TITLE_FLOOD_RATIO_MAX: f64 = 0.4;
/// Caps rule applies to titles longer than this.
const TITLE_CAPS_MIN_CHARS: usize = 10;
const TITLE_CAPS_RATIO_MAX: f64 = 0.9;

// ===== DESCRIPTION RULES =====

const DESCRIPTION_MIN_CHARS: usize = 10;
const DESCRIPTION_MAX_CHARS: usize = 2000;
const DESCRIPTION_REPEAT_RUN: usize = 10;

// ===== PRICE RULES =====

const MAX_PRICE_TRADE: f64 = 50_000.0;
const MAX_PRICE_SERVICE: f64 = 5_000.0;
const MAX_PRICE_FREE: f64 = 0.0;

// ===== COMMENT RULES =====

const COMMENT_MIN_CHARS: usize = 2;
const COMMENT_MAX_CHARS: usize = 500;
const COMMENT_REPEAT_RUN: usize = 10;
/// Digit-ratio rule applies to comments longer than this.
const COMMENT_DIGIT_MIN_CHARS: usize = 20;
const COMMENT_DIGIT_RATIO_MAX: f64 = 0.9;

/// Validate a listing title.
pub fn validate_title(title: &str) -> Verdict {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Verdict::fail(ReasonCode::TitleRequired);
    }

    let len = trimmed.chars().count();
    if len < TITLE_MIN_CHARS {
        return Verdict::fail(ReasonCode::TitleTooShort);
    }
    if len > TITLE_MAX_CHARS {
        return Verdict::fail(ReasonCode::TitleTooLong);
    }

    if contains_url_like(trimmed) {
        return Verdict::fail(ReasonCode::TitleContainsUrl);
    }

    if has_char_run(trimmed, TITLE_REPEAT_RUN) {
        return Verdict::fail(ReasonCode::TitleRepeatedChars);
    }

    let digits = trimmed.chars().filter(char::is_ascii_digit).count();
    if digits as f64 > len as f64 * TITLE_DIGIT_RATIO_MAX {
        return Verdict::fail(ReasonCode::TitleTooManyDigits);
    }

    let letters = trimmed.chars().filter(|c| c.is_alphabetic()).count();
    if letters < TITLE_MIN_LETTERS {
        return Verdict::fail(ReasonCode::TitleTooFewLetters);
    }

    if len > TITLE_FLOOD_MIN_CHARS {
        let mut counts: HashMap<char, usize> = HashMap::new();
        for c in trimmed.chars() {
            if !c.is_alphabetic() && !c.is_whitespace() {
                *counts.entry(c).or_insert(0) += 1;
            }
        }
        if counts
            .values()
            .any(|&n| n as f64 > len as f64 * TITLE_FLOOD_RATIO_MAX)
        {
            return Verdict::fail(ReasonCode::TitleCharacterFlood);
        }
    }

    if len > TITLE_CAPS_MIN_CHARS {
        let upper = trimmed.chars().filter(|c| c.is_uppercase()).count();
        if upper as f64 > letters as f64 * TITLE_CAPS_RATIO_MAX {
            return Verdict::fail(ReasonCode::TitleAllCaps);
        }
    }

    if let Some(reason) = gibberish::detect(trimmed) {
        return Verdict::fail(reason);
    }

    Verdict::ok()
}

/// Validate a listing description. URLs are allowed here, sellers
/// routinely paste contact links.
pub fn validate_description(description: &str) -> Verdict {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Verdict::fail(ReasonCode::DescriptionRequired);
    }

    let len = trimmed.chars().count();
    if len < DESCRIPTION_MIN_CHARS {
        return Verdict::fail(ReasonCode::DescriptionTooShort);
    }
    if len > DESCRIPTION_MAX_CHARS {
        return Verdict::fail(ReasonCode::DescriptionTooLong);
    }

    if has_char_run(trimmed, DESCRIPTION_REPEAT_RUN) {
        return Verdict::fail(ReasonCode::DescriptionRepeatedChars);
    }

    Verdict::ok()
}

/// Validate a listing price against the ceiling for its type.
///
/// Non-finite and negative inputs fold into the same verdict shape as
/// rule failures, so callers get one code path for "bad price".
pub fn validate_price(price: f64, listing_type: ListingType) -> Verdict {
    if !price.is_finite() || price < 0.0 {
        return Verdict::fail(ReasonCode::PriceInvalid);
    }

    if listing_type == ListingType::Free {
        if price != 0.0 {
            return Verdict::fail(ReasonCode::PriceFreeMustBeZero);
        }
    } else if price == 0.0 {
        return Verdict::fail(ReasonCode::PriceZero);
    }

    let max = price_ceiling(listing_type);
    if price > max {
        return Verdict::fail_with_max(ReasonCode::PriceMaxExceeded, max);
    }

    Verdict::ok()
}

/// Validate a comment body.
pub fn validate_comment(text: &str) -> Verdict {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Verdict::fail(ReasonCode::CommentRequired);
    }

    let len = trimmed.chars().count();
    if len < COMMENT_MIN_CHARS {
        return Verdict::fail(ReasonCode::CommentTooShort);
    }
    if len > COMMENT_MAX_CHARS {
        return Verdict::fail(ReasonCode::CommentTooLong);
    }

    if !blocklist::check_content(trimmed).safe {
        return Verdict::fail(ReasonCode::CommentBlockedWords);
    }

    if has_char_run(trimmed, COMMENT_REPEAT_RUN) {
        return Verdict::fail(ReasonCode::CommentRepeatedChars);
    }

    if len > COMMENT_DIGIT_MIN_CHARS {
        let digits = trimmed.chars().filter(char::is_ascii_digit).count();
        if digits as f64 > len as f64 * COMMENT_DIGIT_RATIO_MAX {
            return Verdict::fail(ReasonCode::CommentTooManyDigits);
        }
    }

    let lower = trimmed.to_lowercase();
    if lower.contains("http://") || lower.contains("https://") || lower.contains("www.") {
        return Verdict::fail(ReasonCode::CommentContainsUrl);
    }

    Verdict::ok()
}

/// True when the string contains at least one emoji character.
pub fn has_emoji(text: &str) -> bool {
    text.chars().any(is_emoji_char)
}

/// Range-based check over the common emoji blocks. Not exhaustive over
/// every Unicode release, but catches what people actually paste.
pub fn is_emoji_char(c: char) -> bool {
    let u = c as u32;
    matches!(u,
        0x1F300..=0x1F5FF   // symbols and pictographs
        | 0x1F600..=0x1F64F // emoticons
        | 0x1F680..=0x1F6FF // transport
        | 0x1F700..=0x1F77F // alchemical
        | 0x1F900..=0x1F9FF // supplemental symbols
        | 0x1FA70..=0x1FAFF // extended-A
        | 0x2600..=0x26FF   // misc symbols
        | 0x2700..=0x27BF   // dingbats
        | 0x2B00..=0x2BFF   // arrows, stars
        | 0x1F1E6..=0x1F1FF // regional indicators
        | 0xFE0F            // variation selector
    )
}

fn price_ceiling(listing_type: ListingType) -> f64 {
    match listing_type {
        ListingType::Sell | ListingType::Buy => MAX_PRICE_TRADE,
        ListingType::Service => MAX_PRICE_SERVICE,
        ListingType::Free => MAX_PRICE_FREE,
    }
}

/// Run of `limit` or more identical characters anywhere in the string.
fn has_char_run(text: &str, limit: usize) -> bool {
    let mut prev: Option<char> = None;
    let mut run = 0usize;
    for c in text.chars() {
        if Some(c) == prev {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }
        if run >= limit {
            return true;
        }
    }
    false
}

const URL_MARKERS: &[&str] = &["http://", "https://", "www."];
const URL_TLDS: &[&str] = &[".com", ".net", ".org", ".ru", ".ua", ".me", ".shop", ".store"];

/// URL sniff for titles: explicit markers plus bare host names like
/// "olx.ua". A TLD only counts when glued to a host character and
/// followed by a boundary, so "Nice.Mesh cover" stays clean.
fn contains_url_like(text: &str) -> bool {
    let lower = text.to_lowercase();
    if URL_MARKERS.iter().any(|m| lower.contains(m)) {
        return true;
    }

    for tld in URL_TLDS {
        let mut from = 0usize;
        while let Some(pos) = lower[from..].find(tld) {
            let start = from + pos;
            let end = start + tld.len();
            let host_before = lower[..start]
                .chars()
                .next_back()
                .map_or(false, |c| c.is_alphanumeric());
            let boundary_after = lower[end..]
                .chars()
                .next()
                .map_or(true, |c| c == '/' || c.is_whitespace());
            if host_before && boundary_after {
                return true;
            }
            from = end;
        }
    }
    false
}
