//! Generic, template-independent patterns for technical documents.
//!
//! Used by the fallback result and when deriving templates from match results.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::template::FieldKind;

lazy_static! {
    // Document codes
    pub static ref DOCUMENT_CODE_TP: Regex = Regex::new(
        r"TP-\d{3}-\d{3}-\d{3}"
    ).unwrap();

    pub static ref DOCUMENT_CODE: Regex = Regex::new(
        r"[A-Z]{2,4}-\d{3}-\d{3}-\d{3}"
    ).unwrap();

    pub static ref DOCUMENT_CODE_LABELED: Regex = Regex::new(
        r"문서번호[:\s]*([A-Z0-9-]+)"
    ).unwrap();

    // Dates
    pub static ref DATE_SHORT_DOTTED: Regex = Regex::new(
        r"\d{2}\.\d{2}\.\d{2}"
    ).unwrap();

    pub static ref DATE_ISO: Regex = Regex::new(
        r"\d{4}-\d{2}-\d{2}"
    ).unwrap();

    pub static ref EFFECTIVE_DATE_LABELED: Regex = Regex::new(
        r"시행일[:\s]*(\d{2}\.\d{2}\.\d{2})"
    ).unwrap();

    pub static ref DATE_LABELED: Regex = Regex::new(
        r"날짜[:\s]*(\d{4}-\d{2}-\d{2})"
    ).unwrap();

    // Versions
    pub static ref VERSION_REV: Regex = Regex::new(
        r"Rev\.?\s*(\d+)"
    ).unwrap();

    pub static ref VERSION_REVISION_LABELED: Regex = Regex::new(
        r"개정[:\s]*(\d+)"
    ).unwrap();

    pub static ref VERSION_LABELED: Regex = Regex::new(
        r"버전[:\s]*(\d+)"
    ).unwrap();

    pub static ref VERSION_V: Regex = Regex::new(
        r"V\.?\s*(\d+)"
    ).unwrap();

    // Titles
    pub static ref TITLE_STANDARD: Regex = Regex::new(
        r"^[가-힣\s\(\)]+(?:기준|표준|절차|지침)"
    ).unwrap();

    pub static ref TITLE_NUMBERED: Regex = Regex::new(
        r"^[\d\.]+\s+([가-힣\s]+)"
    ).unwrap();

    // Whole-value classifiers
    pub static ref CODE_VALUE: Regex = Regex::new(
        r"^[A-Z]{2,4}-\d{3}-\d{3}-\d{3}$"
    ).unwrap();

    pub static ref DATE_VALUE: Regex = Regex::new(
        r"^\d{2}\.\d{2}\.\d{2}$"
    ).unwrap();

    pub static ref VERSION_VALUE: Regex = Regex::new(
        r"^Rev\.?\s*\d+$"
    ).unwrap();
}

/// Kinds probed by the fallback, in probe order.
pub const FALLBACK_KINDS: [FieldKind; 4] = [
    FieldKind::Code,
    FieldKind::Date,
    FieldKind::Version,
    FieldKind::Title,
];

/// Generic patterns for a field kind, most specific first.
pub fn generic_patterns(kind: FieldKind) -> Vec<&'static Regex> {
    match kind {
        FieldKind::Code => vec![&*DOCUMENT_CODE_TP, &*DOCUMENT_CODE, &*DOCUMENT_CODE_LABELED],
        FieldKind::Date => vec![
            &*DATE_SHORT_DOTTED,
            &*DATE_ISO,
            &*EFFECTIVE_DATE_LABELED,
            &*DATE_LABELED,
        ],
        FieldKind::Version => vec![
            &*VERSION_REV,
            &*VERSION_REVISION_LABELED,
            &*VERSION_LABELED,
            &*VERSION_V,
        ],
        FieldKind::Title => vec![&*TITLE_STANDARD, &*TITLE_NUMBERED],
        FieldKind::Header | FieldKind::Text => Vec::new(),
    }
}

/// Field name the fallback uses for a kind (`auto_code`, `auto_date`, ...).
pub fn fallback_field_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Code => "auto_code",
        FieldKind::Date => "auto_date",
        FieldKind::Version => "auto_version",
        FieldKind::Title => "auto_title",
        FieldKind::Header => "auto_header",
        FieldKind::Text => "auto_text",
    }
}

/// First capture group if the pattern has one and it participated, else the whole match.
pub fn capture_value<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    let caps = re.captures(text)?;
    caps.get(1).or_else(|| caps.get(0)).map(|m| m.as_str())
}

/// Guess a field kind from an extracted value.
pub fn classify_value(value: &str) -> FieldKind {
    let value = value.trim();

    if CODE_VALUE.is_match(value) {
        FieldKind::Code
    } else if DATE_VALUE.is_match(value) {
        FieldKind::Date
    } else if VERSION_VALUE.is_match(value) {
        FieldKind::Version
    } else if value.chars().count() < 50 && (value.contains("기준") || value.contains("표준")) {
        FieldKind::Title
    } else {
        FieldKind::Text
    }
}
