// Gibberish detector - heuristic screen for keyboard-mash input.
//
// Four ordered checks, first hit wins. This is a tuned heuristic, not a
// language model: the thresholds and the root list were set by trial and
// error against real listing titles, so false positives and negatives
// are part of the contract. Do not "improve" the constants without
// re-tuning against live data.

use super::moderation_models::ReasonCode;

/// Flag a run of this many consecutive consonants.
const CONSONANT_CLUSTER_RUN: usize = 7;

/// Per-token rules apply to tokens longer than this (after stripping).
const WORD_RULE_MIN_CHARS: usize = 4;

/// Rare-character share above which a token is flagged.
const RARE_DENSITY_MAX: f64 = 0.45;

/// Dictionary scan runs for strings longer than this.
const DICTIONARY_SCAN_MIN_CHARS: usize = 8;

/// A single rootless word longer than this is flagged.
const UNKNOWN_WORD_MIN_CHARS: usize = 10;

const LATIN_VOWELS: &str = "aeiou";
const CYRILLIC_VOWELS: &str = "аеёиоуыэюяіїє";
const LATIN_CONSONANTS: &str = "bcdfghjklmnpqrstvwxz";
const CYRILLIC_CONSONANTS: &str = "бвгґджзйклмнпрстфхцчшщ";

/// Characters that are rare in real RU/UK/EN marketplace text.
const RARE_CHARS: &str = "щшъыїєґ";

/// Word roots that mark a string as plausibly real.
///
/// Matched by case-insensitive substring search, so stems are enough
/// ("холодильн" covers холодильник/холодильники/...). Tuned for the
/// категories people actually sell in; extend when a legitimate
/// single-word title gets rejected.
const KNOWN_ROOTS: &[&str] = &[
    // transaction words
    "прода", "купл", "обмін", "обмен", "віддам", "отдам", "оренд", "аренд",
    "дешев", "недорог", "срочн", "термінов", "цін", "цен", "грн",
    // condition words
    "нов", "хорош", "гарн", "відмінн", "отличн", "ідеальн", "идеальн",
    // electronics
    "телефон", "смартфон", "iphone", "samsung", "xiaomi", "apple", "ноутбук",
    "laptop", "комп", "планшет", "монітор", "монитор", "навушник", "наушник",
    "телевізор", "телевизор", "приставк", "консол",
    // appliances
    "холодильн", "пральн", "стиральн", "мікрохвил", "микроволн", "пилосос",
    "пылесос", "плит",
    // furniture
    "диван", "стіл", "стол", "шафа", "шкаф", "крісл", "кресл", "ліжк",
    "кроват", "меблі", "мебель", "матрац", "матрас",
    // kids, clothes
    "коляск", "дитяч", "детск", "іграшк", "игрушк", "одяг", "одежд",
    "взутт", "обув", "куртк", "сукн", "плать", "костюм",
    // transport
    "велосипед", "самокат", "авто", "машин", "мотоцикл", "скутер", "шин",
    "колес", "запчаст",
    // property
    "квартир", "будинок", "дом", "гараж", "ділянк", "участок", "дач",
    // services
    "ремонт", "послуг", "услуг", "робот", "работ", "майстер", "мастер",
    "прибиранн", "уборк", "репетитор", "манікюр", "маникюр",
    // english fillers
    "sale", "sell", "new", "used", "good", "free", "service", "phone",
    "bike", "sofa", "table",
];

fn normalize(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn is_vowel(c: char) -> bool {
    let c = normalize(c);
    LATIN_VOWELS.contains(c) || CYRILLIC_VOWELS.contains(c)
}

fn is_consonant(c: char) -> bool {
    let c = normalize(c);
    LATIN_CONSONANTS.contains(c) || CYRILLIC_CONSONANTS.contains(c)
}

fn is_rare(c: char) -> bool {
    RARE_CHARS.contains(normalize(c))
}

/// Keep only letters and digits; per-token rules work on this form.
fn strip_token(token: &str) -> String {
    token.chars().filter(|c| c.is_alphanumeric()).collect()
}

fn has_consonant_cluster(text: &str) -> bool {
    let mut run = 0usize;
    for c in text.chars() {
        if is_consonant(c) {
            run += 1;
            if run >= CONSONANT_CLUSTER_RUN {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// Run the detector over a string.
///
/// Returns the first rule that fires, in fixed order: consonant cluster,
/// then per-token vowel test, then per-token rare-character density, then
/// the single-long-word dictionary fallback. `None` means the string looks
/// like real words.
pub fn detect(text: &str) -> Option<ReasonCode> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if has_consonant_cluster(trimmed) {
        return Some(ReasonCode::GibberishCluster);
    }

    let tokens: Vec<String> = trimmed
        .split_whitespace()
        .map(strip_token)
        .filter(|t| t.chars().count() > WORD_RULE_MIN_CHARS)
        .collect();

    // pure-numeric tokens (prices, model numbers) are exempt here
    if tokens
        .iter()
        .any(|t| t.chars().any(char::is_alphabetic) && !t.chars().any(is_vowel))
    {
        return Some(ReasonCode::GibberishNoVowels);
    }

    for token in &tokens {
        let len = token.chars().count();
        let rare = token.chars().filter(|c| is_rare(*c)).count();
        if rare as f64 > len as f64 * RARE_DENSITY_MAX {
            return Some(ReasonCode::GibberishDensity);
        }
    }

    let char_len = trimmed.chars().count();
    if char_len > DICTIONARY_SCAN_MIN_CHARS {
        let lower = trimmed.to_lowercase();
        let has_root = KNOWN_ROOTS.iter().any(|root| lower.contains(root));
        let single_word = !trimmed.chars().any(char::is_whitespace);
        if single_word && char_len > UNKNOWN_WORD_MIN_CHARS && !has_root {
            return Some(ReasonCode::GibberishUnknownLongWord);
        }
    }

    None
}
