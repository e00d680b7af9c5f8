//! Row normalization: driver-native values in, [`TypedValue`]s out.
//!
//! Drivers disagree on how they surface the same column (integer width,
//! byte slices vs strings, zoned vs naive timestamps). Normalization maps all
//! of them onto one canonical representation so that a snapshot taken
//! through one driver compares cleanly against live output from another.
//! The transform is pure and total: anything without a dedicated kind ends up
//! in [`TypedValue::Other`] rather than failing.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

use crate::value::{NativeValue, TypedValue};

/// A value exactly as a database driver returned it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// A zoned timestamp.
    DateTime(DateTime<FixedOffset>),
    /// A wall-clock timestamp without zone; interpreted as UTC.
    NaiveDateTime(NaiveDateTime),
    /// Anything else the driver can only describe natively.
    Other(NativeValue),
}

/// One driver row: column names in result-set order.
pub type RawRow = Vec<(String, RawValue)>;

/// One normalized row, keyed by column name.
pub type Row = BTreeMap<String, TypedValue>;

impl From<RawValue> for TypedValue {
    fn from(raw: RawValue) -> Self {
        match raw {
            RawValue::I8(v) => Self::Integer(i64::from(v)),
            RawValue::I16(v) => Self::Integer(i64::from(v)),
            RawValue::I32(v) => Self::Integer(i64::from(v)),
            RawValue::I64(v) => Self::Integer(v),
            RawValue::U8(v) => Self::Integer(i64::from(v)),
            RawValue::U16(v) => Self::Integer(i64::from(v)),
            RawValue::U32(v) => Self::Integer(i64::from(v)),
            RawValue::U64(v) => {
                i64::try_from(v).map_or(Self::Other(NativeValue::Unsigned(v)), Self::Integer)
            }
            RawValue::F32(v) => Self::Float(f64::from(v)),
            RawValue::F64(v) => Self::Float(v),
            RawValue::Bytes(b) => Self::Blob(b),
            RawValue::DateTime(dt) => Self::Timestamp(dt.with_timezone(&Utc)),
            RawValue::NaiveDateTime(naive) => Self::Timestamp(naive.and_utc()),
            RawValue::Text(s) => Self::Text(s),
            RawValue::Bool(b) => Self::Other(NativeValue::Bool(b)),
            RawValue::Null => Self::Other(NativeValue::Null),
            RawValue::Other(native) => Self::Other(native),
        }
    }
}

/// Normalize one driver row.
///
/// Column names are unique within a [`Row`]; if the driver reports the same
/// name twice (e.g. an unaliased join), the later column wins.
#[must_use]
pub fn normalize_row(raw: RawRow) -> Row {
    let mut row = Row::new();
    for (column, value) in raw {
        if row.contains_key(&column) {
            tracing::warn!(%column, "duplicate column name in result row; keeping the last value");
        }
        row.insert(column, TypedValue::from(value));
    }
    row
}

/// Normalize a whole result set, preserving row order.
#[must_use]
pub fn normalize_rows(raw: Vec<RawRow>) -> Vec<Row> {
    raw.into_iter().map(normalize_row).collect()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::i8(RawValue::I8(42))]
    #[case::i16(RawValue::I16(42))]
    #[case::i32(RawValue::I32(42))]
    #[case::i64(RawValue::I64(42))]
    #[case::u8(RawValue::U8(42))]
    #[case::u16(RawValue::U16(42))]
    #[case::u32(RawValue::U32(42))]
    #[case::u64(RawValue::U64(42))]
    fn integers_of_any_width_normalize_equal(#[case] raw: RawValue) {
        assert_eq!(TypedValue::from(raw), TypedValue::Integer(42));
    }

    #[test]
    fn negative_narrow_integer_keeps_sign() {
        assert_eq!(TypedValue::from(RawValue::I16(-7)), TypedValue::Integer(-7));
        assert_eq!(
            TypedValue::from(RawValue::I8(-7)),
            TypedValue::from(RawValue::I64(-7))
        );
    }

    #[test]
    fn huge_unsigned_falls_back_to_other() {
        assert_eq!(
            TypedValue::from(RawValue::U64(u64::MAX)),
            TypedValue::Other(NativeValue::Unsigned(u64::MAX))
        );
    }

    #[test]
    fn bytes_stay_bytes() {
        assert_eq!(
            TypedValue::from(RawValue::Bytes(b"AB".to_vec())),
            TypedValue::Blob(vec![0x41, 0x42])
        );
    }

    #[test]
    fn zoned_and_naive_timestamps_land_in_utc() {
        let zoned = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 7, 30, 0)
            .unwrap();
        let naive = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(
            TypedValue::from(RawValue::DateTime(zoned)),
            TypedValue::from(RawValue::NaiveDateTime(naive))
        );
    }

    #[test]
    fn floats_widen() {
        assert_eq!(TypedValue::from(RawValue::F32(1.5)), TypedValue::Float(1.5));
    }

    #[test]
    fn untypeable_values_become_other() {
        assert_eq!(TypedValue::from(RawValue::Null), TypedValue::null());
        assert_eq!(
            TypedValue::from(RawValue::Bool(true)),
            TypedValue::Other(NativeValue::Bool(true))
        );
        assert_eq!(
            TypedValue::from(RawValue::Other(NativeValue::Text("12.50".into()))),
            TypedValue::Other(NativeValue::Text("12.50".into()))
        );
    }

    #[test]
    fn normalize_row_keys_by_column() {
        let row = normalize_row(vec![
            ("id".into(), RawValue::I32(1)),
            ("name".into(), RawValue::Bytes(vec![0x41, 0x42])),
        ]);
        assert_eq!(row.len(), 2);
        assert_eq!(row["id"], TypedValue::Integer(1));
        assert_eq!(row["name"], TypedValue::Blob(vec![0x41, 0x42]));
    }

    #[test]
    fn duplicate_column_keeps_last_value() {
        let row = normalize_row(vec![
            ("id".into(), RawValue::I64(1)),
            ("id".into(), RawValue::I64(2)),
        ]);
        assert_eq!(row.len(), 1);
        assert_eq!(row["id"], TypedValue::Integer(2));
    }
}
