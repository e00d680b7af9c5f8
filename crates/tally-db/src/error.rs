//! Error types for snapshot generation.

use std::time::Duration;

use tally_core::driver::DriverError;
use tally_core::errors::ParseError;
use thiserror::Error;

/// Errors from generating a snapshot file.
///
/// Any of these means no snapshot file was written.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Could not connect to, or probe, the reference database.
    #[error("connection failed: {0}")]
    Connection(#[source] DriverError),

    /// Connecting did not finish within the connect timeout.
    #[error("connection timed out after {0:?}")]
    Timeout(Duration),

    /// A query from the list failed; generation stops at the first one.
    #[error("query '{query}' failed: {source}")]
    QueryExecution {
        query: String,
        #[source]
        source: DriverError,
    },

    /// The collected snapshot could not be encoded as YAML.
    #[error("failed to serialize snapshot: {0}")]
    Serialization(#[from] serde_yaml::Error),

    /// Reading the query list or writing the snapshot failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The query list was unusable.
    #[error(transparent)]
    Parse(#[from] ParseError),
}
