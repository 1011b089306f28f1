//! ASTM header timestamp helpers: `YYYYMMDDHHMMSS`, per the Header record's
//! date/time-of-message field.
//!
//! Grounded in the teacher's `protocol/astm/mod.rs::AstmProtocol` trait,
//! which exposes `parse_datetime`/`format_datetime` helpers of this same
//! shape for its Header/Order record timestamp fields. Kept as a small
//! standalone utility rather than folded into `record.rs`, since
//! typed-record coercion (the "record mapping" layer) is out of scope here.

use chrono::{NaiveDateTime, Utc};

const ASTM_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Formats `dt` as an ASTM timestamp field value.
pub fn format_timestamp(dt: NaiveDateTime) -> String {
    dt.format(ASTM_TIMESTAMP_FORMAT).to_string()
}

/// The current UTC time, formatted as an ASTM timestamp field value.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now().naive_utc())
}

/// Parses an ASTM timestamp field value (`YYYYMMDDHHMMSS`).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, ASTM_TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_a_timestamp() {
        let dt = NaiveDateTime::parse_from_str("2026-07-28 13:45:09", "%Y-%m-%d %H:%M:%S").unwrap();
        let formatted = format_timestamp(dt);
        assert_eq!(formatted, "20260728134509");
        assert_eq!(parse_timestamp(&formatted).unwrap(), dt);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_timestamp("not-a-timestamp").is_none());
    }
}
