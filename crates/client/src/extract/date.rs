//! Best-effort date parsing for article metadata.
//!
//! Formats are tried in order and the first success wins. Running out of
//! formats means "no date", never an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Bare `YYYY-MM-DD` or `MM/DD/YYYY` dates in running text.
static DATE_IN_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{4})\b").expect("invalid regex"));

/// ISO-8601 datetimes carrying a numeric offset without a colon.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%z"];

/// ISO-8601 datetimes without an offset, read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] =
    &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Literal date formats, tried after every datetime form.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

pub(crate) fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(raw, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&parsed));
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format)
            && let Some(midnight) = date.and_hms_opt(0, 0, 0)
        {
            return Some(Utc.from_utc_datetime(&midnight));
        }
    }

    tracing::debug!("no date format matched {:?}", raw);
    None
}

/// First parseable date mentioned in `text`.
pub(crate) fn find_date_in_text(text: &str) -> Option<DateTime<Utc>> {
    DATE_IN_TEXT
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| parse_date(m.as_str()))
}
