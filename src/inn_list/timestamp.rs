//! Timestamp decoding and display formatting for result entries.
//!
//! The validation service emits either RFC 3339 instants or bare local
//! date-times (`2024-01-01T10:00`). Bare values carry no offset and are
//! pinned to `+00:00`, so their calendar fields display exactly as sent.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serializer};

/// Accepted layouts for offset-less timestamps.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a wire timestamp.
///
/// Returns `None` when the value matches neither RFC 3339 nor one of the
/// naive layouts.
pub fn parse(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    NAIVE_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(raw, fmt)
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    })
}

/// Render as `DD.MM.YYYY H:MM` using the timestamp's own calendar fields.
///
/// Day, month and minute are zero-padded; the 24-hour clock hour is not.
pub fn format_display(ts: &DateTime<FixedOffset>) -> String {
    format!(
        "{:02}.{:02}.{} {}:{:02}",
        ts.day(),
        ts.month(),
        ts.year(),
        ts.hour(),
        ts.minute()
    )
}

pub(crate) fn serialize<S>(ts: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&ts.to_rfc3339())
}

pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("unparseable timestamp: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_naive_minutes() {
        let ts = parse("2024-01-01T10:00").unwrap();
        assert_eq!(format_display(&ts), "01.01.2024 10:00");
        assert_eq!(ts.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_parse_rfc3339_keeps_local_fields() {
        let ts = parse("2024-03-05T07:04:00+03:00").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 3 * 3600);
        assert_eq!(format_display(&ts), "05.03.2024 7:04");
    }

    #[test]
    fn test_parse_space_separated_with_seconds() {
        let ts = parse("2023-12-31 23:59:59").unwrap();
        assert_eq!(format_display(&ts), "31.12.2023 23:59");
    }

    #[test]
    fn test_hour_is_not_padded() {
        let ts = parse("2024-06-09T00:05").unwrap();
        assert_eq!(format_display(&ts), "09.06.2024 0:05");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse("yesterday").is_none());
        assert!(parse("").is_none());
        assert!(parse("2024-13-01T10:00").is_none());
    }
}
