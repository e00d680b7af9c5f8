//! Value conversion helpers for libSQL rows.
//!
//! libSQL hands back one of five storage classes. These helpers lift them
//! into [`RawValue`] and handle the timestamp issue: `SQLite` has no
//! timestamp storage class, so dates live in TEXT columns either as RFC 3339
//! (`"2026-02-09T14:30:00+00:00"`), as `SQLite`'s default format
//! (`"2026-02-09 14:30:00"`) or as a bare date.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tally_core::normalize::RawValue;

/// Parse a TEXT value as `DateTime<Utc>`.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD` (midnight UTC).
/// Returns `None` when the text is none of these.
#[must_use]
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Whether a declared column type names a date or time.
///
/// Matches `DATE`, `DATETIME`, `TIMESTAMP`, `TIME` in any case.
#[must_use]
pub fn is_temporal_decl_type(decl_type: &str) -> bool {
    let upper = decl_type.to_ascii_uppercase();
    upper.contains("DATE") || upper.contains("TIME")
}

/// Convert one libSQL value, using the column's declared type to recognize
/// timestamps stored as text.
#[must_use]
pub fn to_raw_value(value: libsql::Value, decl_type: Option<&str>) -> RawValue {
    match value {
        libsql::Value::Null => RawValue::Null,
        libsql::Value::Integer(i) => RawValue::I64(i),
        libsql::Value::Real(f) => RawValue::F64(f),
        libsql::Value::Blob(bytes) => RawValue::Bytes(bytes),
        libsql::Value::Text(text) => match decl_type {
            Some(decl) if is_temporal_decl_type(decl) => match parse_datetime(&text) {
                Some(dt) => RawValue::DateTime(dt.fixed_offset()),
                None => RawValue::Text(text),
            },
            _ => RawValue::Text(text),
        },
    }
}
