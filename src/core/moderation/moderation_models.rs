// Moderation domain models - verdict shapes shared by all validators.
//
// These are pure domain types with no HTTP or storage dependencies.
// The api layer serializes them as-is for the advisory pre-check endpoint,
// and the listing/comment services embed them in rejection errors.

use serde::Serialize;

/// Why a validator rejected its input.
///
/// A closed set: one variant per rule violation. Every variant has a stable
/// snake_case key used for localized messages and API payloads, so callers
/// never see free-form error text from this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCode {
    // Title rules
    TitleRequired,
    TitleTooShort,
    TitleTooLong,
    TitleContainsUrl,
    TitleRepeatedChars,
    TitleTooManyDigits,
    TitleTooFewLetters,
    TitleCharacterFlood,
    TitleAllCaps,

    // Gibberish detector
    GibberishCluster,
    GibberishNoVowels,
    GibberishDensity,
    GibberishUnknownLongWord,

    // Description rules
    DescriptionRequired,
    DescriptionTooShort,
    DescriptionTooLong,
    DescriptionRepeatedChars,

    // Price rules
    PriceInvalid,
    PriceFreeMustBeZero,
    PriceZero,
    PriceMaxExceeded,

    // Comment rules
    CommentRequired,
    CommentTooShort,
    CommentTooLong,
    CommentBlockedWords,
    CommentRepeatedChars,
    CommentTooManyDigits,
    CommentContainsUrl,
}

impl ReasonCode {
    /// All variants, in rule order. Keeps `from_key` and the i18n
    /// exhaustiveness test in one place.
    pub fn all() -> &'static [ReasonCode] {
        &[
            ReasonCode::TitleRequired,
            ReasonCode::TitleTooShort,
            ReasonCode::TitleTooLong,
            ReasonCode::TitleContainsUrl,
            ReasonCode::TitleRepeatedChars,
            ReasonCode::TitleTooManyDigits,
            ReasonCode::TitleTooFewLetters,
            ReasonCode::TitleCharacterFlood,
            ReasonCode::TitleAllCaps,
            ReasonCode::GibberishCluster,
            ReasonCode::GibberishNoVowels,
            ReasonCode::GibberishDensity,
            ReasonCode::GibberishUnknownLongWord,
            ReasonCode::DescriptionRequired,
            ReasonCode::DescriptionTooShort,
            ReasonCode::DescriptionTooLong,
            ReasonCode::DescriptionRepeatedChars,
            ReasonCode::PriceInvalid,
            ReasonCode::PriceFreeMustBeZero,
            ReasonCode::PriceZero,
            ReasonCode::PriceMaxExceeded,
            ReasonCode::CommentRequired,
            ReasonCode::CommentTooShort,
            ReasonCode::CommentTooLong,
            ReasonCode::CommentBlockedWords,
            ReasonCode::CommentRepeatedChars,
            ReasonCode::CommentTooManyDigits,
            ReasonCode::CommentContainsUrl,
        ]
    }

    /// Stable string key for this reason (used in API payloads and i18n lookup).
    pub fn as_key(&self) -> &'static str {
        match self {
            ReasonCode::TitleRequired => "validation_title_required",
            ReasonCode::TitleTooShort => "validation_title_short",
            ReasonCode::TitleTooLong => "validation_title_long",
            ReasonCode::TitleContainsUrl => "validation_title_url",
            ReasonCode::TitleRepeatedChars => "validation_title_repeated_chars",
            ReasonCode::TitleTooManyDigits => "validation_title_digits",
            ReasonCode::TitleTooFewLetters => "validation_title_few_letters",
            ReasonCode::TitleCharacterFlood => "validation_title_char_flood",
            ReasonCode::TitleAllCaps => "validation_title_caps",
            ReasonCode::GibberishCluster => "gibberish_cluster",
            ReasonCode::GibberishNoVowels => "gibberish_no_vowels",
            ReasonCode::GibberishDensity => "gibberish_density",
            ReasonCode::GibberishUnknownLongWord => "gibberish_unknown_long_word",
            ReasonCode::DescriptionRequired => "validation_description_required",
            ReasonCode::DescriptionTooShort => "validation_description_short",
            ReasonCode::DescriptionTooLong => "validation_description_long",
            ReasonCode::DescriptionRepeatedChars => "validation_description_repeated_chars",
            ReasonCode::PriceInvalid => "validation_price_invalid",
            ReasonCode::PriceFreeMustBeZero => "validation_price_free_not_zero",
            ReasonCode::PriceZero => "validation_price_zero",
            ReasonCode::PriceMaxExceeded => "validation_price_max_exceeded",
            ReasonCode::CommentRequired => "validation_comment_required",
            ReasonCode::CommentTooShort => "validation_comment_short",
            ReasonCode::CommentTooLong => "validation_comment_long",
            ReasonCode::CommentBlockedWords => "validation_comment_blocked_words",
            ReasonCode::CommentRepeatedChars => "validation_comment_repeated_chars",
            ReasonCode::CommentTooManyDigits => "validation_comment_digits",
            ReasonCode::CommentContainsUrl => "validation_comment_url",
        }
    }

    /// Parse a reason back from its string key. Only the key round-trip
    /// check needs this; production traffic never parses keys inbound.
    #[cfg(test)]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|r| r.as_key() == key)
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_key())
    }
}

impl Serialize for ReasonCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_key())
    }
}

/// Extra values a failed rule wants interpolated into its message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VerdictParams {
    /// Price ceiling for the listing type, set on `PriceMaxExceeded`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
}

/// Result of a single validation call.
///
/// Expected rejections are values, never errors: callers branch on `valid`
/// and map `reason` to a localized message. Serializes as
/// `{valid, errorKey?, params?}` for the Mini App client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub valid: bool,
    #[serde(rename = "errorKey", skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<VerdictParams>,
}

impl Verdict {
    /// Create a passing verdict.
    pub fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
            params: None,
        }
    }

    /// Create a failing verdict with the rule that fired.
    pub fn fail(reason: ReasonCode) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            params: None,
        }
    }

    /// Create a failing price verdict carrying the ceiling for message interpolation.
    pub fn fail_with_max(reason: ReasonCode, max_price: f64) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            params: Some(VerdictParams {
                max_price: Some(max_price),
            }),
        }
    }
}

/// Result of the blocklist / image-name screens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentCheck {
    pub safe: bool,
    pub flagged: Vec<String>,
}

impl ContentCheck {
    /// A clean result with nothing flagged.
    pub fn clean() -> Self {
        Self {
            safe: true,
            flagged: Vec::new(),
        }
    }

    /// Build a result from matched terms; safe iff the list is empty.
    pub fn from_matches(terms: Vec<String>) -> Self {
        Self {
            safe: terms.is_empty(),
            flagged: terms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_key_round_trip() {
        for reason in ReasonCode::all() {
            assert_eq!(ReasonCode::from_key(reason.as_key()), Some(*reason));
        }
        assert_eq!(ReasonCode::from_key("not_a_reason"), None);
    }

    #[test]
    fn test_verdict_serialization_shape() {
        let verdict = Verdict::fail_with_max(ReasonCode::PriceMaxExceeded, 50_000.0);
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["errorKey"], "validation_price_max_exceeded");
        assert_eq!(json["params"]["maxPrice"], 50_000.0);

        let ok = serde_json::to_value(Verdict::ok()).unwrap();
        assert_eq!(ok["valid"], true);
        assert!(ok.get("errorKey").is_none());
        assert!(ok.get("params").is_none());
    }

    #[test]
    fn test_content_check_safe_flag() {
        assert!(ContentCheck::from_matches(vec![]).safe);
        assert!(!ContentCheck::from_matches(vec!["casino".to_string()]).safe);
    }
}
