// Channel importer - turns exported Telegram channel posts into listings.
//
// This is deliberately heuristic text scraping: first line becomes the
// title, the first number glued to a currency marker becomes the price,
// marker words pick the listing type, and the category comes from the
// catalog keyword scan. Every draft then goes through the exact same
// validation as a hand-filled form, so the importer cannot smuggle in
// content a user could not post.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::categories::category_catalog;
use crate::core::listings::{
    ContactInfo, ListingError, ListingService, ListingStore, ListingType, NewListing,
};
use crate::core::moderation::lexical;

const TITLE_IMPORT_MAX_CHARS: usize = 100;
const DESCRIPTION_IMPORT_MAX_CHARS: usize = 2000;
/// Bodies shorter than this fall back to the whole post text.
const BODY_MIN_CHARS: usize = 10;

const FREE_MARKERS: &[&str] = &["безкоштовно", "бесплатно", "віддам", "отдам", "даром"];
const BUY_MARKERS: &[&str] = &["куплю", "шукаю", "ищу"];
const SERVICE_MARKERS: &[&str] = &[
    "послуг", "услуг", "ремонт", "монтаж", "доставка", "репетитор", "манікюр", "маникюр",
];
const CURRENCY_MARKERS: &[&str] = &["грн", "uah", "₴", "usd", "$"];

/// One exported post, as the admin tooling dumps them.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelPost {
    pub text: String,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedPost {
    pub index: usize,
    /// Either a moderation reason key or one of the importer's own
    /// markers ("unparseable", "unknown_category").
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported: u32,
    pub skipped: Vec<SkippedPost>,
}

pub struct ImportService<S: ListingStore> {
    listings: ListingService<S>,
}

impl<S: ListingStore> ImportService<S> {
    pub fn new(listings: ListingService<S>) -> Self {
        Self { listings }
    }

    /// Import a batch of posts under the given author id.
    ///
    /// Posts that fail to parse or fail validation are recorded in the
    /// report and the batch keeps going; only storage errors abort.
    pub async fn run(
        &self,
        author_id: u64,
        channel: &str,
        posts: &[ChannelPost],
    ) -> Result<ImportReport, ListingError> {
        let mut report = ImportReport::default();

        for (index, post) in posts.iter().enumerate() {
            tracing::debug!(index, posted_at = ?post.posted_at, "importing channel post");

            let Some(mut draft) = parse_post(&post.text) else {
                report.skipped.push(SkippedPost {
                    index,
                    reason: "unparseable".to_string(),
                });
                continue;
            };

            // posts with no contact of their own point buyers at the channel
            if draft.contact.is_empty() {
                let handle = channel.trim().trim_start_matches('@');
                if !handle.is_empty() {
                    draft.contact.telegram = Some(handle.to_string());
                }
            }

            match self.listings.create(author_id, draft).await {
                Ok(_) => report.imported += 1,
                Err(ListingError::Rejected(verdict)) => {
                    let reason = verdict
                        .reason
                        .map(|r| r.as_key().to_string())
                        .unwrap_or_else(|| "rejected".to_string());
                    report.skipped.push(SkippedPost { index, reason });
                }
                Err(ListingError::UnknownCategory(_)) => {
                    report.skipped.push(SkippedPost {
                        index,
                        reason: "unknown_category".to_string(),
                    });
                }
                Err(ListingError::TooManyImages(_)) => {
                    report.skipped.push(SkippedPost {
                        index,
                        reason: "too_many_images".to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }
}

/// Parse a raw post into a listing draft. `None` means there was no
/// usable title line at all.
pub fn parse_post(text: &str) -> Option<NewListing> {
    let title_line = text.lines().map(str::trim).find(|l| !l.is_empty())?;
    let stripped: String = title_line
        .chars()
        .filter(|c| !lexical::is_emoji_char(*c))
        .collect();
    let title: String = stripped.trim().chars().take(TITLE_IMPORT_MAX_CHARS).collect();
    if title.is_empty() {
        return None;
    }

    let description = parse_body(text);

    let lower = text.to_lowercase();
    let is_free = FREE_MARKERS.iter().any(|m| lower.contains(m));
    let listing_type = if is_free {
        ListingType::Free
    } else if BUY_MARKERS.iter().any(|m| lower.contains(m)) {
        ListingType::Buy
    } else if SERVICE_MARKERS.iter().any(|m| lower.contains(m)) {
        ListingType::Service
    } else {
        ListingType::Sell
    };

    let price = if is_free {
        0.0
    } else {
        parse_price(&lower).unwrap_or(0.0)
    };

    Some(NewListing {
        title,
        description,
        price,
        listing_type,
        category: category_catalog::guess_for_text(text).to_string(),
        subcategory: None,
        images: vec![],
        contact: parse_contacts(text),
        location: None,
    })
}

/// Everything after the title line; falls back to the full text when the
/// rest is too short to stand alone.
fn parse_body(text: &str) -> String {
    let mut seen_title = false;
    let mut rest: Vec<&str> = Vec::new();
    for line in text.lines() {
        if !seen_title {
            if !line.trim().is_empty() {
                seen_title = true;
            }
            continue;
        }
        rest.push(line);
    }

    let body = rest.join("\n").trim().to_string();
    let chosen = if body.chars().count() >= BODY_MIN_CHARS {
        body
    } else {
        text.trim().to_string()
    };
    chosen.chars().take(DESCRIPTION_IMPORT_MAX_CHARS).collect()
}

/// First digit run glued to a currency marker, either side, spaces
/// allowed inside the number ("2 500 грн", "$ 120").
pub fn parse_price(lower: &str) -> Option<f64> {
    let chars: Vec<char> = lower.chars().collect();
    let markers: Vec<Vec<char>> = CURRENCY_MARKERS.iter().map(|m| m.chars().collect()).collect();

    for i in 0..chars.len() {
        for marker in &markers {
            if i + marker.len() <= chars.len() && chars[i..i + marker.len()] == marker[..] {
                let value = number_before(&chars, i).or_else(|| number_after(&chars, i + marker.len()));
                if value.is_some() {
                    return value;
                }
            }
        }
    }
    None
}

fn number_before(chars: &[char], end: usize) -> Option<f64> {
    let mut j = end;
    while j > 0 && chars[j - 1] == ' ' {
        j -= 1;
    }
    let stop = j;
    while j > 0 && (chars[j - 1].is_ascii_digit() || chars[j - 1] == ' ') {
        j -= 1;
    }
    parse_digit_run(&chars[j..stop])
}

fn number_after(chars: &[char], start: usize) -> Option<f64> {
    let mut j = start;
    while j < chars.len() && chars[j] == ' ' {
        j += 1;
    }
    let begin = j;
    while j < chars.len() && (chars[j].is_ascii_digit() || chars[j] == ' ') {
        j += 1;
    }
    parse_digit_run(&chars[begin..j])
}

fn parse_digit_run(run: &[char]) -> Option<f64> {
    let digits: String = run.iter().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}

/// Pull a @username and/or a phone-shaped digit run out of the text.
fn parse_contacts(text: &str) -> ContactInfo {
    let mut telegram = None;
    for token in text.split_whitespace() {
        if let Some(stripped) = token.strip_prefix('@') {
            let name: String = stripped
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect();
            if name.len() >= 5 {
                telegram = Some(name);
                break;
            }
        }
    }

    ContactInfo {
        phone: find_phone(text),
        telegram,
    }
}

fn find_phone(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let is_sep = |c: char| matches!(c, ' ' | '-' | '(' | ')');

    for i in 0..chars.len() {
        let c = chars[i];
        if c != '+' && !c.is_ascii_digit() {
            continue;
        }
        // anchor only at the start of a run
        if i > 0 && (chars[i - 1].is_ascii_digit() || chars[i - 1] == '+') {
            continue;
        }

        let mut j = i;
        if chars[j] == '+' {
            j += 1;
        }
        let begin = j;
        while j < chars.len() && (chars[j].is_ascii_digit() || is_sep(chars[j])) {
            j += 1;
        }

        let digits: String = chars[begin..j].iter().filter(|c| c.is_ascii_digit()).collect();
        let plausible_start =
            chars[i] == '+' || digits.starts_with('0') || digits.starts_with('3');
        if (10..=15).contains(&digits.len()) && plausible_start {
            return Some(if chars[i] == '+' {
                format!("+{digits}")
            } else {
                digits
            });
        }
    }
    None
}
