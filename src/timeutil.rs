use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::model::Ms;

/// Parse an ISO 8601 datetime (with or without offset/seconds) to unix ms.
/// Naive datetimes are interpreted as UTC — the system does no timezone
/// handling.
pub fn parse_iso(s: &str) -> Option<Ms> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    None
}

/// Parse the console input format `YYYY-MM-DD HH:MM`.
pub fn parse_console(s: &str) -> Option<Ms> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

pub fn format_iso(ms: Ms) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Calendar day (UTC) an instant falls on.
pub fn date_of(ms: Ms) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|dt| dt.date_naive())
}

pub fn now_ms() -> Ms {
    Utc::now().timestamp_millis()
}
