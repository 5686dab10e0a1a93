use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

static HYPHEN_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").expect("valid regex"));

// Also accepts the spaced form `2025. 1. 5.` used by some exports.
static DOT_SLASH_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*[./]\s*(\d{1,2})\s*[./]\s*(\d{1,2})").expect("valid regex")
});

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];

/// What to do with a row whose date cell cannot be normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DatePolicy {
    /// Skip the row.
    DropUnparseable,
    /// Put the row under [`crate::formats::UNKNOWN_DATE_KEY`].
    BucketAsUnknown,
    /// Attach the row to the most recently resolved date; rows before the
    /// first resolved date are skipped.
    #[default]
    CarryForwardPrevious,
}

impl DatePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DropUnparseable => "drop",
            Self::BucketAsUnknown => "unknown",
            Self::CarryForwardPrevious => "carry-forward",
        }
    }
}

impl FromStr for DatePolicy {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "drop" | "drop-unparseable" => Ok(Self::DropUnparseable),
            "unknown" | "bucket-as-unknown" => Ok(Self::BucketAsUnknown),
            "" | "carry-forward" | "carry-forward-previous" => Ok(Self::CarryForwardPrevious),
            other => anyhow::bail!(
                "unsupported date policy: {other} (expected drop, unknown or carry-forward)"
            ),
        }
    }
}

/// Normalizes a date-like cell into a `YYYY-MM-DD` key.
///
/// Tries full date/time parsing first, then falls back to extracting a
/// hyphenated date, then a dot/slash delimited one, anywhere in the string.
pub fn normalize_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(date) = parse_calendar_date(trimmed) {
        return Some(date.format("%Y-%m-%d").to_string());
    }

    if let Some(key) = extract_with(&HYPHEN_DATE, trimmed) {
        return Some(key);
    }

    extract_with(&DOT_SLASH_DATE, trimmed)
}

fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    None
}

fn extract_with(pattern: &Regex, raw: &str) -> Option<String> {
    let caps = pattern.captures(raw)?;
    let year = caps.get(1)?.as_str();
    let month = caps.get(2)?.as_str();
    let day = caps.get(3)?.as_str();
    Some(format!("{year}-{month:0>2}-{day:0>2}"))
}
