//! Классификация текста одной ячейки: маркер квартиры, текст раздела или обычный текст.

use once_cell::sync::Lazy;
use regex::Regex;

/// Префикс нормализованной метки квартиры
pub const APARTMENT_PREFIX: &str = "Кв. ";

/// Текст длиннее этого считается названием раздела, а не квартирой
const SECTION_MIN_LEN: usize = 45;

static APARTMENT_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^квартир[аы]?\b[\s№#:.\-–]*(.*)$").expect("valid apartment regex")
});

static APARTMENT_ABBREV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^кв\.?\s+(.+)$").expect("valid abbreviation regex"));

/// Уже сокращённая метка внутри полезной нагрузки: "Кв. 3", "кв.3"
static PAYLOAD_ABBREV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^кв\.\s*").expect("valid payload prefix regex"));

static UNIT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-zА-Яа-яЁё]{1,2}-\d+$").expect("valid unit code regex"));

static SECTION_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)комнат|помещени|поверхност|\bпол(?:ы|а|у|ом|ов)?\b|отделк|материал|стяжк|кухн|санузел|санузл|ванн|потол|коридор|прихож|спальн|гостин",
    )
    .expect("valid section keyword regex")
});

static NUMBERING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d.]+$").expect("valid numbering regex"));

static NUMBERING_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:[.)]\d*)+\s*").expect("valid numbering prefix regex"));

/// Результат классификации ячейки
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellKind {
    Empty,
    /// Маркер квартиры с нормализованной меткой
    Apartment(String),
    /// Похоже на название раздела (помещение, вид работ, материал)
    SectionLike,
    Plain,
}

/// Классифицировать текст ячейки
pub fn classify(text: &str) -> CellKind {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return CellKind::Empty;
    }
    if let Some(label) = apartment_label(trimmed) {
        return CellKind::Apartment(label);
    }
    if looks_like_section(trimmed) {
        CellKind::SectionLike
    } else {
        CellKind::Plain
    }
}

/// Извлечь нормализованную метку квартиры, если ячейка является маркером квартиры
pub fn apartment_label(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(caps) = APARTMENT_WORD.captures(trimmed) {
        let payload = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        if payload.is_empty() || looks_like_section(payload) {
            return None;
        }
        return Some(normalize_payload(payload));
    }

    if let Some(caps) = APARTMENT_ABBREV.captures(trimmed) {
        let payload = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        // "кв. м" и подобные единицы измерения не содержат цифр
        if !payload.chars().any(|c| c.is_ascii_digit()) || looks_like_section(payload) {
            return None;
        }
        return Some(normalize_payload(payload));
    }

    if UNIT_CODE.is_match(trimmed) {
        return Some(trimmed.to_string());
    }

    None
}

fn normalize_payload(payload: &str) -> String {
    let rest = match PAYLOAD_ABBREV.find(payload) {
        Some(m) if m.end() < payload.len() => &payload[m.end()..],
        _ => payload,
    };
    format!("{}{}", APARTMENT_PREFIX, rest)
}

/// Текст похож на название раздела: длинный или содержит строительные ключевые слова
pub fn looks_like_section(text: &str) -> bool {
    text.chars().count() > SECTION_MIN_LEN || SECTION_KEYWORDS.is_match(text)
}

/// Ячейка содержит только нумерацию ("12", "1.2.", "3.")
pub fn is_numbering(text: &str) -> bool {
    NUMBERING.is_match(text.trim())
}

/// Ячейка не содержит ни букв, ни цифр
pub fn is_punctuation(text: &str) -> bool {
    !text.chars().any(char::is_alphanumeric)
}

/// Убрать ведущую нумерацию вида "1.", "1.2.", "2)"
pub fn strip_numbering_prefix(text: &str) -> &str {
    let trimmed = text.trim();
    match NUMBERING_PREFIX.find(trimmed) {
        Some(m) => trimmed[m.end()..].trim(),
        None => trimmed,
    }
}
