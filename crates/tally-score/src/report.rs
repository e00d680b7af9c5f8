//! Check outcomes.

use std::fmt;

use serde::{Serialize, Serializer};
use tally_core::matcher::MismatchError;
use tally_core::phase::CheckPhase;

use crate::error::ScoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Connect and probe only.
    Login,
    /// Replay a snapshot query and compare its results.
    Query,
}

impl CheckKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one check: either the award with success, or no award with a
/// reason.
///
/// A failed check has exactly one of `error` (infrastructure failure) or
/// `mismatch` (the service answered wrongly) set.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub check: CheckKind,
    pub address: String,
    /// User the check logged in as, once one was selected.
    pub user: Option<String>,
    /// Query replayed by a query check, once one was selected.
    pub query: Option<String>,
    pub awarded: u32,
    pub success: bool,
    /// Final phase; `done` on success, `failed` otherwise.
    pub phase: CheckPhase,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<ScoreError>,
    pub mismatch: Option<MismatchError>,
}

impl CheckReport {
    /// Human-readable reason for a failed check.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        match (&self.error, &self.mismatch) {
            (Some(error), _) => Some(error.to_string()),
            (None, Some(mismatch)) => Some(mismatch.to_string()),
            (None, None) => None,
        }
    }
}

#[derive(Serialize)]
struct ErrorView<'a> {
    kind: &'a str,
    message: String,
}

#[allow(clippy::ref_option)]
fn serialize_error<S: Serializer>(
    error: &Option<ScoreError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    error
        .as_ref()
        .map(|e| ErrorView {
            kind: e.kind().as_str(),
            message: e.to_string(),
        })
        .serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn failed(error: Option<ScoreError>, mismatch: Option<MismatchError>) -> CheckReport {
        CheckReport {
            check: CheckKind::Query,
            address: "10.0.0.5".into(),
            user: Some("alice".into()),
            query: Some("SELECT 1".into()),
            awarded: 0,
            success: false,
            phase: CheckPhase::Failed,
            error,
            mismatch,
        }
    }

    #[test]
    fn error_serializes_with_kind_and_message() {
        let report = failed(
            Some(ScoreError::Timeout {
                stage: "connect",
                after: Duration::from_millis(250),
            }),
            None,
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["check"], "query");
        assert_eq!(json["phase"], "failed");
        assert_eq!(json["error"]["kind"], "timeout");
        assert_eq!(json["error"]["message"], "connect timed out after 250ms");
        assert!(json["mismatch"].is_null());
    }

    #[test]
    fn mismatch_serializes_with_reason_tag() {
        let report = failed(
            None,
            Some(MismatchError::RowCount {
                expected: 2,
                actual: 1,
            }),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["error"].is_null());
        assert_eq!(json["mismatch"]["reason"], "row_count");
        assert_eq!(json["mismatch"]["expected"], 2);
        assert_eq!(
            report.reason().as_deref(),
            Some("row count mismatch: expected 2 rows, got 1")
        );
    }
}
