// Bad-word matcher - substring screen against a fixed blocklist.
//
// Case-insensitive `contains` over a short curated list of scam, gambling
// and explicit-content terms. Deliberately dumb: no stemming, no word
// boundaries. The list is small enough that a linear scan per call is
// cheaper than anything clever.

use super::moderation_models::ContentCheck;

/// Terms that make content unsafe wherever they appear.
const BLOCKED_TERMS: &[&str] = &[
    // gambling
    "казино",
    "casino",
    "букмекер",
    "ставки на спорт",
    // explicit
    "порно",
    "porn",
    "xxx",
    "эскорт",
    "escort",
    "onlyfans",
    // scam / pharma
    "виагра",
    "viagra",
    "заработок в интернете",
    "быстрый заработок",
    "без вложений",
];

/// File extensions accepted for listing images.
const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Scan free text for blocked terms.
///
/// Returns every matched term in blocklist order, so the caller can log
/// or display exactly what tripped the screen.
pub fn check_content(text: &str) -> ContentCheck {
    let lower = text.to_lowercase();
    let matched: Vec<String> = BLOCKED_TERMS
        .iter()
        .filter(|term| lower.contains(*term))
        .map(|term| term.to_string())
        .collect();
    ContentCheck::from_matches(matched)
}

/// Screen an uploaded image's file name.
///
/// The stem goes through the same term scan as free text, and the
/// extension must be on the image allow-list. Flag entries for extension
/// problems are prefixed with `extension:` to keep them distinguishable
/// from term matches.
pub fn check_image_name(name: &str) -> ContentCheck {
    let lower = name.to_lowercase();

    let (stem, extension) = match lower.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (lower.as_str(), None),
    };

    let mut flagged: Vec<String> = BLOCKED_TERMS
        .iter()
        .filter(|term| stem.contains(*term))
        .map(|term| term.to_string())
        .collect();

    match extension {
        Some(ext) if ALLOWED_IMAGE_EXTENSIONS.contains(&ext) => {}
        Some(ext) => flagged.push(format!("extension:{ext}")),
        None => flagged.push("extension:missing".to_string()),
    }

    ContentCheck::from_matches(flagged)
}
