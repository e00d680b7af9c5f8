//! Order-insensitive multiset matching of result sets.
//!
//! Database result order is not stable unless the query pins it, so a live
//! result matches a snapshot when the two are equal as multisets of rows.
//! Each expected row consumes the first still-unclaimed actual row that is
//! field-equal to it. This is O(n²) and breaks ties by first available match;
//! a successful total match is order-independent regardless of tie-break,
//! and consumption makes duplicate expected rows demand as many duplicates
//! in the actual set.

use serde::Serialize;
use thiserror::Error;

use crate::normalize::Row;

/// Why a live result set did not match the expected one.
///
/// This is a scoring outcome, not an infrastructure failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum MismatchError {
    /// The result sets have different cardinality. No partial credit.
    #[error("row count mismatch: expected {expected} rows, got {actual}")]
    RowCount { expected: usize, actual: usize },

    /// No unclaimed actual row equals this expected row.
    #[error("no match found for expected row {index}")]
    UnmatchedRow { index: usize },
}

/// Field-equality of two rows: identical column-name sets and kind-aware
/// value equality in every column.
#[must_use]
pub fn rows_equal(expected: &Row, actual: &Row) -> bool {
    expected.len() == actual.len()
        && expected.iter().all(|(column, value)| {
            actual
                .get(column)
                .is_some_and(|other| value.matches(other))
        })
}

/// Compare two result sets as multisets of rows.
///
/// # Errors
///
/// Returns [`MismatchError`] describing the first reason the sets differ.
pub fn compare_rows(expected: &[Row], actual: &[Row]) -> Result<(), MismatchError> {
    if expected.len() != actual.len() {
        return Err(MismatchError::RowCount {
            expected: expected.len(),
            actual: actual.len(),
        });
    }

    let mut consumed = vec![false; actual.len()];
    for (index, want) in expected.iter().enumerate() {
        let hit = (0..actual.len()).find(|&i| !consumed[i] && rows_equal(want, &actual[i]));
        match hit {
            Some(i) => consumed[i] = true,
            None => return Err(MismatchError::UnmatchedRow { index }),
        }
    }
    Ok(())
}

/// `true` when `actual` equals `expected` as a multiset of rows.
#[must_use]
pub fn rows_match(expected: &[Row], actual: &[Row]) -> bool {
    compare_rows(expected, actual).is_ok()
}
