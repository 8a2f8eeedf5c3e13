//! Timestamp normalization for feed dates.
//!
//! Feeds disagree on how to write a date: RSS uses RFC 2822 mail dates,
//! Atom uses RFC 3339, and RSS 1.0 `dc:date` is ISO-8601 in whatever
//! precision the publisher felt like. Everything is parsed into a zoned
//! instant, compared in UTC, and printed back in a single RFC 3339 form.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// ISO-8601 layouts carrying an explicit offset, tried after strict RFC 3339.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
    // Hour-only offsets such as `+05`
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
];

/// ISO-8601 layouts without an offset. These are read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a feed timestamp into a zoned instant.
///
/// Tries ISO-8601 first (a trailing `Z` means UTC, a missing offset is read
/// as UTC, a bare `YYYY-MM-DD` is midnight), then RFC 2822. Returns `None`
/// for empty or unrecognized input; never fails loudly.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    parse_iso(trimmed).or_else(|| parse_mail_date(trimmed))
}

fn parse_iso(value: &str) -> Option<DateTime<FixedOffset>> {
    let normalized: Cow<'_, str> = match value.strip_suffix('Z') {
        Some(head) => Cow::Owned(format!("{head}+00:00")),
        None => Cow::Borrowed(value),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt);
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Some(dt);
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

fn parse_mail_date(value: &str) -> Option<DateTime<FixedOffset>> {
    if let Some(dt) = parse_rfc2822_lenient(value) {
        return Some(dt);
    }

    // Zone abbreviations outside RFC 2822 (JST, CEST, IST, ...) are read as UTC.
    let (head, zone) = value.rsplit_once(char::is_whitespace)?;
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    parse_rfc2822_lenient(&format!("{} +0000", head.trim_end()))
}

fn parse_rfc2822_lenient(value: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt);
    }

    // Publishers routinely get the weekday wrong ("Mon, 01 Jan 2024"), which
    // chrono rejects. The weekday carries no information, so drop it.
    let (_, rest) = value.split_once(',')?;
    DateTime::parse_from_rfc2822(rest.trim()).ok()
}

/// Maps an optional instant onto the UTC timeline used for sorting.
///
/// Undated entries get the earliest representable instant, so a descending
/// sort puts them after everything that has a date.
pub fn sort_key(instant: Option<DateTime<FixedOffset>>) -> DateTime<Utc> {
    match instant {
        Some(dt) => dt.with_timezone(&Utc),
        None => DateTime::<Utc>::MIN_UTC,
    }
}

/// Renders an instant as UTC RFC 3339 with a `Z` suffix.
///
/// Sub-second digits are only printed when present. This is the only form
/// ever stored in `NewsEntry::published`.
pub fn format_timestamp(instant: Option<DateTime<FixedOffset>>) -> Option<String> {
    instant.map(|dt| {
        dt.with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::AutoSi, true)
    })
}
