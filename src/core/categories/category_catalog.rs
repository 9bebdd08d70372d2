// Static category catalog for the marketplace.
//
// Categories, their subcategories and their filter definitions are
// compile-time data, same as the original product: they change with a
// release, not at runtime. Filters are explicit tagged variants so a
// typo in a filter definition is a compile error, not a runtime surprise.
//
// `keywords` feed the importer's category guesser. They are lowercase
// substrings, intentionally loose.

use serde::Serialize;

use crate::core::i18n::Lang;

/// One filter control shown on the feed page for a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilterDef {
    Select {
        key: &'static str,
        options: &'static [&'static str],
    },
    Boolean {
        key: &'static str,
    },
    Range {
        key: &'static str,
        min: f64,
        max: f64,
        unit: &'static str,
    },
    Text {
        key: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subcategory {
    pub slug: &'static str,
    pub name_uk: &'static str,
    pub name_ru: &'static str,
    pub name_en: &'static str,
}

impl Subcategory {
    pub fn name_for(&self, lang: Lang) -> &'static str {
        match lang {
            Lang::Uk => self.name_uk,
            Lang::Ru => self.name_ru,
            Lang::En => self.name_en,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub slug: &'static str,
    pub emoji: &'static str,
    pub name_uk: &'static str,
    pub name_ru: &'static str,
    pub name_en: &'static str,
    pub subcategories: &'static [Subcategory],
    pub filters: &'static [FilterDef],
    pub keywords: &'static [&'static str],
}

impl Category {
    pub fn name_for(&self, lang: Lang) -> &'static str {
        match lang {
            Lang::Uk => self.name_uk,
            Lang::Ru => self.name_ru,
            Lang::En => self.name_en,
        }
    }
}

/// Fallback category for anything the guesser cannot place.
pub const FALLBACK_CATEGORY: &str = "other";

const CATALOG: &[Category] = &[
    Category {
        slug: "electronics",
        emoji: "📱",
        name_uk: "Електроніка",
        name_ru: "Электроника",
        name_en: "Electronics",
        subcategories: &[
            Subcategory { slug: "phones", name_uk: "Телефони", name_ru: "Телефоны", name_en: "Phones" },
            Subcategory { slug: "laptops", name_uk: "Ноутбуки", name_ru: "Ноутбуки", name_en: "Laptops" },
            Subcategory { slug: "tv-audio", name_uk: "ТВ та аудіо", name_ru: "ТВ и аудио", name_en: "TV & audio" },
            Subcategory { slug: "accessories", name_uk: "Аксесуари", name_ru: "Аксессуары", name_en: "Accessories" },
        ],
        filters: &[
            FilterDef::Select { key: "brand", options: &["apple", "samsung", "xiaomi", "other"] },
            FilterDef::Boolean { key: "warranty" },
        ],
        keywords: &[
            "iphone", "samsung", "xiaomi", "телефон", "смартфон", "ноутбук", "laptop",
            "планшет", "телевізор", "телевизор", "навушник", "наушник", "комп'ютер",
            "компьютер", "приставк", "playstation", "xbox", "монітор", "монитор",
        ],
    },
    Category {
        slug: "furniture",
        emoji: "🪑",
        name_uk: "Меблі",
        name_ru: "Мебель",
        name_en: "Furniture",
        subcategories: &[
            Subcategory { slug: "sofas", name_uk: "Дивани", name_ru: "Диваны", name_en: "Sofas" },
            Subcategory { slug: "tables", name_uk: "Столи", name_ru: "Столы", name_en: "Tables" },
            Subcategory { slug: "wardrobes", name_uk: "Шафи", name_ru: "Шкафы", name_en: "Wardrobes" },
            Subcategory { slug: "beds", name_uk: "Ліжка", name_ru: "Кровати", name_en: "Beds" },
        ],
        filters: &[
            FilterDef::Select { key: "condition", options: &["new", "used"] },
        ],
        keywords: &[
            "диван", "стіл", "стол", "шафа", "шкаф", "крісло", "кресло", "ліжко",
            "кровать", "меблі", "мебель", "матрац", "матрас", "комод",
        ],
    },
    Category {
        slug: "clothes",
        emoji: "👕",
        name_uk: "Одяг та взуття",
        name_ru: "Одежда и обувь",
        name_en: "Clothes & shoes",
        subcategories: &[
            Subcategory { slug: "women", name_uk: "Жіночий", name_ru: "Женская", name_en: "Women" },
            Subcategory { slug: "men", name_uk: "Чоловічий", name_ru: "Мужская", name_en: "Men" },
            Subcategory { slug: "kids", name_uk: "Дитячий", name_ru: "Детская", name_en: "Kids" },
        ],
        filters: &[
            FilterDef::Select { key: "size", options: &["xs", "s", "m", "l", "xl"] },
            FilterDef::Text { key: "brand" },
        ],
        keywords: &[
            "куртка", "сукня", "платье", "джинси", "джинсы", "взуття", "обувь",
            "кросівки", "кроссовки", "футболк", "одяг", "одежда", "пальто",
        ],
    },
    Category {
        slug: "kids",
        emoji: "🧸",
        name_uk: "Дитячі товари",
        name_ru: "Детские товары",
        name_en: "Kids' goods",
        subcategories: &[
            Subcategory { slug: "strollers", name_uk: "Коляски", name_ru: "Коляски", name_en: "Strollers" },
            Subcategory { slug: "toys", name_uk: "Іграшки", name_ru: "Игрушки", name_en: "Toys" },
        ],
        filters: &[
            FilterDef::Boolean { key: "new" },
        ],
        keywords: &[
            "коляск", "дитяч", "детск", "іграшк", "игрушк", "автокрісло", "автокресло",
        ],
    },
    Category {
        slug: "auto",
        emoji: "🚗",
        name_uk: "Авто та запчастини",
        name_ru: "Авто и запчасти",
        name_en: "Auto & parts",
        subcategories: &[
            Subcategory { slug: "cars", name_uk: "Автомобілі", name_ru: "Автомобили", name_en: "Cars" },
            Subcategory { slug: "moto", name_uk: "Мото", name_ru: "Мото", name_en: "Moto" },
            Subcategory { slug: "parts", name_uk: "Запчастини", name_ru: "Запчасти", name_en: "Parts" },
            Subcategory { slug: "tires", name_uk: "Шини та диски", name_ru: "Шины и диски", name_en: "Tires & rims" },
        ],
        filters: &[
            FilterDef::Range { key: "year", min: 1980.0, max: 2026.0, unit: "" },
            FilterDef::Text { key: "model" },
        ],
        keywords: &[
            "авто", "машин", "bmw", "audi", "toyota", "honda", "мотоцикл", "скутер",
            "шини", "шины", "диски", "запчаст",
        ],
    },
    Category {
        slug: "realty",
        emoji: "🏠",
        name_uk: "Нерухомість",
        name_ru: "Недвижимость",
        name_en: "Real estate",
        subcategories: &[
            Subcategory { slug: "rent", name_uk: "Оренда", name_ru: "Аренда", name_en: "Rent" },
            Subcategory { slug: "sale", name_uk: "Продаж", name_ru: "Продажа", name_en: "Sale" },
            Subcategory { slug: "garages", name_uk: "Гаражі", name_ru: "Гаражи", name_en: "Garages" },
        ],
        filters: &[
            FilterDef::Range { key: "area", min: 1.0, max: 500.0, unit: "м²" },
        ],
        keywords: &[
            "квартир", "кімнат", "комнат", "будинок", "гараж", "ділянк", "участок",
        ],
    },
    Category {
        slug: "services",
        emoji: "🔧",
        name_uk: "Послуги",
        name_ru: "Услуги",
        name_en: "Services",
        subcategories: &[
            Subcategory { slug: "repair", name_uk: "Ремонт", name_ru: "Ремонт", name_en: "Repair" },
            Subcategory { slug: "cleaning", name_uk: "Прибирання", name_ru: "Уборка", name_en: "Cleaning" },
            Subcategory { slug: "tutoring", name_uk: "Репетиторство", name_ru: "Репетиторство", name_en: "Tutoring" },
            Subcategory { slug: "beauty", name_uk: "Краса", name_ru: "Красота", name_en: "Beauty" },
        ],
        filters: &[
            FilterDef::Boolean { key: "remote" },
        ],
        keywords: &[
            "ремонт", "послуг", "услуг", "прибиранн", "уборк", "репетитор", "манікюр",
            "маникюр", "доставк", "монтаж", "сантехнік", "сантехник", "електрик",
            "электрик",
        ],
    },
    Category {
        slug: "free",
        emoji: "🎁",
        name_uk: "Віддам даром",
        name_ru: "Отдам даром",
        name_en: "Giveaway",
        subcategories: &[],
        filters: &[],
        keywords: &["безкоштовно", "бесплатно", "віддам", "отдам", "даром"],
    },
    Category {
        slug: "other",
        emoji: "📦",
        name_uk: "Різне",
        name_ru: "Разное",
        name_en: "Other",
        subcategories: &[],
        filters: &[],
        keywords: &[],
    },
];

/// The whole catalog, in display order.
pub fn all() -> &'static [Category] {
    CATALOG
}

pub fn find(slug: &str) -> Option<&'static Category> {
    CATALOG.iter().find(|c| c.slug == slug)
}

/// True when the category exists and the subcategory (if given) belongs
/// to it. A missing subcategory is always fine.
pub fn selection_is_valid(category: &str, subcategory: Option<&str>) -> bool {
    let Some(cat) = find(category) else {
        return false;
    };
    match subcategory {
        None => true,
        Some(sub) => cat.subcategories.iter().any(|s| s.slug == sub),
    }
}

/// Guess a category for free text by keyword scan, catalog order, first
/// hit wins. Falls back to "other".
pub fn guess_for_text(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    for category in CATALOG {
        if category.keywords.iter().any(|k| lower.contains(k)) {
            return category.slug;
        }
    }
    FALLBACK_CATEGORY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_known_slugs() {
        assert!(find("electronics").is_some());
        assert!(find("other").is_some());
        assert!(find("spaceships").is_none());
    }

    #[test]
    fn test_fallback_category_exists() {
        assert!(find(FALLBACK_CATEGORY).is_some());
    }

    #[test]
    fn test_selection_validation() {
        assert!(selection_is_valid("electronics", None));
        assert!(selection_is_valid("electronics", Some("phones")));
        assert!(!selection_is_valid("electronics", Some("sofas")));
        assert!(!selection_is_valid("spaceships", None));
        // categories without subcategories reject any subcategory
        assert!(!selection_is_valid("free", Some("anything")));
    }

    #[test]
    fn test_guess_for_text() {
        assert_eq!(guess_for_text("Продам iPhone 13 у гарному стані"), "electronics");
        assert_eq!(guess_for_text("Віддам диван, самовивіз"), "furniture");
        assert_eq!(guess_for_text("Репетитор з математики"), "services");
        // keyword scan is catalog-order, first hit wins
        assert_eq!(guess_for_text("Ремонт пральних машин"), "auto");
        assert_eq!(guess_for_text("Щось дивне без ключових слів"), "other");
    }

    #[test]
    fn test_localized_names() {
        let cat = find("furniture").unwrap();
        assert_eq!(cat.name_for(Lang::Uk), "Меблі");
        assert_eq!(cat.name_for(Lang::Ru), "Мебель");
        assert_eq!(cat.name_for(Lang::En), "Furniture");
    }

    #[test]
    fn test_filter_defs_serialize_tagged() {
        let filter = FilterDef::Select {
            key: "brand",
            options: &["apple", "samsung"],
        };
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["type"], "select");
        assert_eq!(json["key"], "brand");
        assert_eq!(json["options"][0], "apple");

        let range = FilterDef::Range {
            key: "area",
            min: 1.0,
            max: 500.0,
            unit: "м²",
        };
        let json = serde_json::to_value(&range).unwrap();
        assert_eq!(json["type"], "range");
        assert_eq!(json["max"], 500.0);
    }
}
