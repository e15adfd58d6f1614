//! Instant parsing and the vendor's fixed date wire format.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Wire format for every date-valued field the vendor stores.
pub const VENDOR_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S +00:00";

/// Render an instant the way the vendor expects date fields.
pub fn format_vendor_date(instant: &DateTime<Utc>) -> String {
    instant.format(VENDOR_DATE_FORMAT).to_string()
}

/// Whole seconds since the epoch.
pub fn unix_seconds(instant: &DateTime<Utc>) -> i64 {
    instant.timestamp()
}

/// Recognize an ISO-8601 date or date-time string.
///
/// Only strings that start with a full calendar date qualify, so free text and
/// bare numbers are left alone by the date rewrite.
pub fn parse_iso_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if !raw.get(..10).is_some_and(looks_like_calendar_date) {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if raw.len() == 10 {
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

/// Lenient parsing for event timestamps: ISO-8601, a bare year, or epoch
/// milliseconds.
pub fn parse_instant(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => parse_iso_instant(s).or_else(|| parse_year(s)),
        serde_json::Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_millis_opt(millis).single()
        }
        _ => None,
    }
}

fn parse_year(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.len() != 4 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = raw.parse().ok()?;
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()
}

fn looks_like_calendar_date(prefix: &str) -> bool {
    let bytes = prefix.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
}
