//! Date normalization for the formats that actually show up in feeds and
//! article pages: RFC 3339/2822, bare ISO, and the dotted day-first
//! formats Turkish publishers use, with or without a label prefix.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use crate::error::FeedError;

/// Day-first patterns tried in order after the generic parsers fail.
/// chrono rejects out-of-range day/month values, so an invalid candidate
/// like "32.13.2025" falls through to the next pattern.
const DAY_FIRST_DATETIME_PATTERNS: &[&str] = &[
    "%d.%m.%Y - %H:%M:%S",
    "%d.%m.%Y - %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DAY_FIRST_DATE_PATTERNS: &[&str] = &["%d.%m.%Y", "%d/%m/%Y", "%d-%m-%Y"];

/// Month names as Turkish publishers write them, plus diacritic-stripped
/// spellings seen in hand-edited feeds.
const MONTHS: &[(&str, u32)] = &[
    ("ocak", 1),
    ("şubat", 2),
    ("subat", 2),
    ("mart", 3),
    ("nisan", 4),
    ("mayıs", 5),
    ("mayis", 5),
    ("haziran", 6),
    ("temmuz", 7),
    ("ağustos", 8),
    ("agustos", 8),
    ("eylül", 9),
    ("eylul", 9),
    ("ekim", 10),
    ("kasım", 11),
    ("kasim", 11),
    ("aralık", 12),
    ("aralik", 12),
];

/// Parse a heterogeneous date string into a canonical UTC timestamp.
///
/// Tries the generic RFC/ISO parsers first, then the day-first locale
/// patterns, then month-name dates. If everything fails, strips a known
/// label prefix ("Son Güncelleme:", "Last updated:", ...) and retries
/// once. Timestamps without an offset are interpreted as UTC.
pub fn normalize(raw: &str) -> Result<DateTime<Utc>, FeedError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FeedError::DateFormat(raw.to_string()));
    }

    if let Some(dt) = parse_known(trimmed) {
        return Ok(dt);
    }

    let stripped = strip_label(trimmed);
    if stripped != trimmed {
        if let Some(dt) = parse_known(stripped) {
            return Ok(dt);
        }
    }

    Err(FeedError::DateFormat(raw.to_string()))
}

fn parse_known(s: &str) -> Option<DateTime<Utc>> {
    parse_generic(s)
        .or_else(|| parse_day_first(s))
        .or_else(|| parse_month_name(s))
}

/// RFC 3339, RFC 2822, and bare ISO forms. Cheapest and most common.
fn parse_generic(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.and_utc());
        }
    }
    if let Ok(nd) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(nd.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

fn parse_day_first(s: &str) -> Option<DateTime<Utc>> {
    for fmt in DAY_FIRST_DATETIME_PATTERNS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.and_utc());
        }
    }
    for fmt in DAY_FIRST_DATE_PATTERNS {
        if let Ok(nd) = NaiveDate::parse_from_str(s, fmt) {
            return Some(nd.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }
    None
}

/// "15 Haziran 2025", optionally followed by "17:00" or "- 17:00".
fn parse_month_name(s: &str) -> Option<DateTime<Utc>> {
    let re = Regex::new(
        r"(?i)^\s*(\d{1,2})\s+(\p{L}+)\s+(\d{4})(?:\s*[-,]?\s*(\d{1,2}):(\d{2}))?\s*$",
    )
    .expect("valid regex");
    let caps = re.captures(s)?;

    let day: u32 = caps[1].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    let month_word = caps[2].to_lowercase();
    let month = MONTHS
        .iter()
        .find(|(name, _)| *name == month_word)
        .map(|(_, m)| *m)?;

    let (hour, minute) = match (caps.get(4), caps.get(5)) {
        (Some(h), Some(m)) => (h.as_str().parse().ok()?, m.as_str().parse().ok()?),
        _ => (0, 0),
    };

    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(hour, minute, 0)
        .map(|ndt| ndt.and_utc())
}

/// Remove a leading label such as "Son Güncelleme:" so the remainder can
/// go back through the parsers.
fn strip_label(s: &str) -> &str {
    let re = Regex::new(
        r"(?i)^\s*(son güncelleme|güncelleme tarihi|güncelleme|yayınlanma tarihi|yayınlanma|yayın tarihi|last updated|published on|published|updated)\s*:?\s*",
    )
    .expect("valid regex");
    match re.find(s) {
        Some(m) => &s[m.end()..],
        None => s,
    }
}
