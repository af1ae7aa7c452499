//! ISO-8601 timestamp parsing and canonical formatting.
//! Canonical form is UTC, second precision, explicit `+00:00` offset —
//! lexicographic order on canonical strings matches chronological order.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use crate::error::{AppError, Result};

/// Current UTC time in canonical form.
pub fn now_iso() -> String {
    format_iso(Utc::now())
}

/// Render a timestamp in canonical form, truncating sub-second precision.
pub fn format_iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Parse an ISO-8601 timestamp. Accepts a trailing `Z`, any numeric UTC
/// offset, or a naive timestamp (taken as UTC). Offsets are converted to UTC.
pub fn parse_iso(ts: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = ts.parse::<NaiveDateTime>() {
        return Ok(naive.and_utc());
    }
    Err(AppError::InvalidArgument(
        "timestamp must be ISO-8601 (e.g., 2026-02-12T14:05:00Z)".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trailing_z() {
        let dt = parse_iso("2026-02-12T14:05:00Z").unwrap();
        assert_eq!(format_iso(dt), "2026-02-12T14:05:00+00:00");
    }

    #[test]
    fn converts_offsets_to_utc() {
        let dt = parse_iso("2026-02-12T14:05:00+05:00").unwrap();
        assert_eq!(format_iso(dt), "2026-02-12T09:05:00+00:00");
    }

    #[test]
    fn naive_timestamps_are_taken_as_utc() {
        let dt = parse_iso("2026-02-12T14:05:00").unwrap();
        assert_eq!(format_iso(dt), "2026-02-12T14:05:00+00:00");
    }

    #[test]
    fn subseconds_are_truncated_on_format() {
        let dt = parse_iso("2026-02-12T14:05:00.750Z").unwrap();
        assert_eq!(format_iso(dt), "2026-02-12T14:05:00+00:00");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_iso("not-a-timestamp").is_err());
        assert!(parse_iso("").is_err());
        assert!(parse_iso("2026-13-40T99:99:99Z").is_err());
    }

    #[test]
    fn canonical_strings_sort_chronologically() {
        let a = format_iso(parse_iso("2026-02-12T09:00:00Z").unwrap());
        let b = format_iso(parse_iso("2026-02-12T14:05:00+05:00").unwrap());
        // b is 09:05 UTC — later than a
        assert!(a < b);
    }
}
