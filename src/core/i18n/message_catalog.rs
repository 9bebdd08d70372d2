// Localized messages for moderation reason codes.
//
// The validators only ever return stable string keys; this table is the
// single place those keys become user-facing text. The match is
// exhaustive over ReasonCode, so adding a rule without adding its three
// translations is a compile error.

use serde::{Deserialize, Serialize};

use crate::core::moderation::{ReasonCode, Verdict};

/// Languages the Mini App ships in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Uk,
    Ru,
    En,
}

impl Lang {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::Uk => "uk",
            Lang::Ru => "ru",
            Lang::En => "en",
        }
    }

    /// Parse a Telegram `language_code` (BCP-47-ish, e.g. "uk-UA", "ru").
    /// Prefix match, case-insensitive.
    pub fn from_code(code: &str) -> Option<Self> {
        let lower = code.trim().to_lowercase();
        if lower.starts_with("uk") {
            Some(Lang::Uk)
        } else if lower.starts_with("ru") {
            Some(Lang::Ru)
        } else if lower.starts_with("en") {
            Some(Lang::En)
        } else {
            None
        }
    }

    pub fn from_code_or_default(code: &str) -> Self {
        Self::from_code(code).unwrap_or_default()
    }
}

/// The message template for a reason code. Templates may contain a
/// `{max}` placeholder filled by `render`.
pub fn message_for(lang: Lang, reason: ReasonCode) -> &'static str {
    use ReasonCode::*;
    match reason {
        TitleRequired => match lang {
            Lang::Uk => "Вкажіть назву оголошення",
            Lang::Ru => "Укажите название объявления",
            Lang::En => "Please enter a title",
        },
        TitleTooShort => match lang {
            Lang::Uk => "Назва надто коротка (мінімум 5 символів)",
            Lang::Ru => "Название слишком короткое (минимум 5 символов)",
            Lang::En => "Title is too short (5 characters minimum)",
        },
        TitleTooLong => match lang {
            Lang::Uk => "Назва надто довга (максимум 100 символів)",
            Lang::Ru => "Название слишком длинное (максимум 100 символов)",
            Lang::En => "Title is too long (100 characters maximum)",
        },
        TitleContainsUrl => match lang {
            Lang::Uk => "Посилання в назві заборонені",
            Lang::Ru => "Ссылки в названии запрещены",
            Lang::En => "Links are not allowed in the title",
        },
        TitleRepeatedChars => match lang {
            Lang::Uk => "Назва містить забагато повторюваних символів",
            Lang::Ru => "Название содержит слишком много повторяющихся символов",
            Lang::En => "Title contains too many repeated characters",
        },
        TitleTooManyDigits => match lang {
            Lang::Uk => "Назва складається майже з самих цифр",
            Lang::Ru => "Название состоит почти из одних цифр",
            Lang::En => "Title is almost all digits",
        },
        TitleTooFewLetters => match lang {
            Lang::Uk => "Додайте в назву хоча б кілька літер",
            Lang::Ru => "Добавьте в название хотя бы несколько букв",
            Lang::En => "Add at least a couple of letters to the title",
        },
        TitleCharacterFlood => match lang {
            Lang::Uk => "Назва містить забагато однакових знаків",
            Lang::Ru => "Название содержит слишком много одинаковых знаков",
            Lang::En => "Title contains too many of the same symbol",
        },
        TitleAllCaps => match lang {
            Lang::Uk => "Не пишіть назву лише великими літерами",
            Lang::Ru => "Не пишите название одними заглавными буквами",
            Lang::En => "Don't write the title in all caps",
        },
        GibberishCluster => match lang {
            Lang::Uk => "Назва схожа на випадковий набір літер",
            Lang::Ru => "Название похоже на случайный набор букв",
            Lang::En => "Title looks like random keystrokes",
        },
        GibberishNoVowels => match lang {
            Lang::Uk => "У словах назви немає голосних, перевірте текст",
            Lang::Ru => "В словах названия нет гласных, проверьте текст",
            Lang::En => "Words in the title have no vowels, please check it",
        },
        GibberishDensity => match lang {
            Lang::Uk => "Назва виглядає як випадкові символи",
            Lang::Ru => "Название выглядит как случайные символы",
            Lang::En => "Title looks like random characters",
        },
        GibberishUnknownLongWord => match lang {
            Lang::Uk => "Не вдалося розпізнати жодного слова в назві",
            Lang::Ru => "Не удалось распознать ни одного слова в названии",
            Lang::En => "Couldn't recognize any words in the title",
        },
        DescriptionRequired => match lang {
            Lang::Uk => "Додайте опис оголошення",
            Lang::Ru => "Добавьте описание объявления",
            Lang::En => "Please enter a description",
        },
        DescriptionTooShort => match lang {
            Lang::Uk => "Опис надто короткий (мінімум 10 символів)",
            Lang::Ru => "Описание слишком короткое (минимум 10 символов)",
            Lang::En => "Description is too short (10 characters minimum)",
        },
        DescriptionTooLong => match lang {
            Lang::Uk => "Опис надто довгий (максимум 2000 символів)",
            Lang::Ru => "Описание слишком длинное (максимум 2000 символов)",
            Lang::En => "Description is too long (2000 characters maximum)",
        },
        DescriptionRepeatedChars => match lang {
            Lang::Uk => "Опис містить забагато повторюваних символів",
            Lang::Ru => "Описание содержит слишком много повторяющихся символов",
            Lang::En => "Description contains too many repeated characters",
        },
        PriceInvalid => match lang {
            Lang::Uk => "Вкажіть коректну ціну",
            Lang::Ru => "Укажите корректную цену",
            Lang::En => "Please enter a valid price",
        },
        PriceFreeMustBeZero => match lang {
            Lang::Uk => "Для безкоштовного оголошення ціна має бути 0",
            Lang::Ru => "Для бесплатного объявления цена должна быть 0",
            Lang::En => "Free listings must have a price of 0",
        },
        PriceZero => match lang {
            Lang::Uk => "Вкажіть ціну, більшу за нуль",
            Lang::Ru => "Укажите цену больше нуля",
            Lang::En => "Price must be greater than zero",
        },
        PriceMaxExceeded => match lang {
            Lang::Uk => "Ціна не може перевищувати {max} грн",
            Lang::Ru => "Цена не может превышать {max} грн",
            Lang::En => "Price cannot exceed {max}",
        },
        CommentRequired => match lang {
            Lang::Uk => "Напишіть текст коментаря",
            Lang::Ru => "Напишите текст комментария",
            Lang::En => "Please enter a comment",
        },
        CommentTooShort => match lang {
            Lang::Uk => "Коментар надто короткий",
            Lang::Ru => "Комментарий слишком короткий",
            Lang::En => "Comment is too short",
        },
        CommentTooLong => match lang {
            Lang::Uk => "Коментар надто довгий (максимум 500 символів)",
            Lang::Ru => "Комментарий слишком длинный (максимум 500 символов)",
            Lang::En => "Comment is too long (500 characters maximum)",
        },
        CommentBlockedWords => match lang {
            Lang::Uk => "Коментар містить заборонені слова",
            Lang::Ru => "Комментарий содержит запрещённые слова",
            Lang::En => "Comment contains blocked words",
        },
        CommentRepeatedChars => match lang {
            Lang::Uk => "Коментар містить забагато повторюваних символів",
            Lang::Ru => "Комментарий содержит слишком много повторяющихся символов",
            Lang::En => "Comment contains too many repeated characters",
        },
        CommentTooManyDigits => match lang {
            Lang::Uk => "Коментар складається майже з самих цифр",
            Lang::Ru => "Комментарий состоит почти из одних цифр",
            Lang::En => "Comment is almost all digits",
        },
        CommentContainsUrl => match lang {
            Lang::Uk => "Посилання в коментарях заборонені",
            Lang::Ru => "Ссылки в комментариях запрещены",
            Lang::En => "Links are not allowed in comments",
        },
    }
}

/// Turn a failing verdict into a ready-to-show message, interpolating
/// `params.max_price` into the `{max}` placeholder. Returns `None` for
/// passing verdicts.
pub fn render(lang: Lang, verdict: &Verdict) -> Option<String> {
    let reason = verdict.reason?;
    let template = message_for(lang, reason);

    let max = verdict.params.as_ref().and_then(|p| p.max_price);
    match max {
        Some(max) => Some(template.replace("{max}", &format_amount(max))),
        None => Some(template.to_string()),
    }
}

/// Prices are whole hryvnias in practice; keep decimals only when present.
fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{ReasonCode, Verdict};

    #[test]
    fn test_every_reason_has_all_translations() {
        for reason in ReasonCode::all() {
            for lang in [Lang::Uk, Lang::Ru, Lang::En] {
                assert!(
                    !message_for(lang, *reason).is_empty(),
                    "empty message for {reason} in {}",
                    lang.as_str()
                );
            }
        }
    }

    #[test]
    fn test_lang_from_code_prefix_match() {
        assert_eq!(Lang::from_code("uk-UA"), Some(Lang::Uk));
        assert_eq!(Lang::from_code("RU"), Some(Lang::Ru));
        assert_eq!(Lang::from_code("en-GB"), Some(Lang::En));
        assert_eq!(Lang::from_code("de"), None);
        assert_eq!(Lang::from_code_or_default("de"), Lang::Uk);
    }

    #[test]
    fn test_render_interpolates_ceiling() {
        let verdict = Verdict::fail_with_max(ReasonCode::PriceMaxExceeded, 50_000.0);
        let message = render(Lang::Uk, &verdict).unwrap();
        assert!(message.contains("50000"));
        assert!(!message.contains("{max}"));
    }

    #[test]
    fn test_render_passes_through_plain_messages() {
        let verdict = Verdict::fail(ReasonCode::TitleTooShort);
        let message = render(Lang::En, &verdict).unwrap();
        assert_eq!(message, "Title is too short (5 characters minimum)");

        assert_eq!(render(Lang::En, &Verdict::ok()), None);
    }
}
