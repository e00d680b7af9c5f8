//! Scoring error types.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tally_core::driver::DriverError;
use tally_core::errors::ParseError;
use thiserror::Error;

use crate::registry::RegistryError;

/// Infrastructure failures that end a check without an award.
///
/// A result mismatch is not an error; see [`crate::CheckReport::mismatch`].
#[derive(Debug, Error)]
pub enum ScoreError {
    /// The service was unreachable, refused the credential, or failed the
    /// liveness probe.
    #[error("connection failed: {0}")]
    Connection(#[source] DriverError),

    /// A deadline expired.
    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: &'static str, after: Duration },

    /// Credentials or snapshot data could not be used.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The service rejected or failed the replayed query.
    #[error("query execution failed: {0}")]
    QueryExecution(#[source] DriverError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScoreError {
    /// Coarse classification for reports and logs.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) => ErrorKind::Connection,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Parse(_) => ErrorKind::Parse,
            Self::QueryExecution(_) => ErrorKind::QueryExecution,
            Self::Registry(RegistryError::Io(_)) | Self::Io(_) => ErrorKind::Io,
            Self::Registry(_) => ErrorKind::Parse,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Connection,
    Timeout,
    Parse,
    QueryExecution,
    Io,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::Parse => "parse",
            Self::QueryExecution => "query_execution",
            Self::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
