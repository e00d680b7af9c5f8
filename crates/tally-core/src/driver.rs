//! Database driver seam.
//!
//! The scorer and the snapshot generator only need two things from a
//! database client: open a connection to a target under a credential, and
//! run parameterless text queries that come back as column-named rows of
//! driver-native values. [`Connector`] and [`SqlConnection`] abstract over
//! that; `tally-db` provides the libSQL implementation.
//!
//! Connections are released by `Drop`.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::credential::Credential;
use crate::normalize::RawRow;

/// Where to connect. The credential is supplied separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub address: String,
    pub port: u16,
    pub database: String,
    /// Deadline for connecting plus the liveness probe.
    pub connect_timeout: Duration,
}

/// Failures reported by a driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The server was unreachable or refused the credential.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Connected, but the liveness probe failed.
    #[error("liveness probe failed: {0}")]
    Probe(String),

    /// The database rejected or failed a query.
    #[error("query failed: {0}")]
    Query(String),
}

/// Opens connections.
pub trait Connector: Send + Sync {
    type Connection: SqlConnection;

    /// Open a fresh connection. Does not probe liveness.
    fn connect(
        &self,
        target: &ConnectionTarget,
        credential: &Credential,
    ) -> impl Future<Output = Result<Self::Connection, DriverError>> + Send;
}

/// A live connection.
pub trait SqlConnection: Send + Sync {
    /// Cheap round trip proving the session is usable.
    fn ping(&self) -> impl Future<Output = Result<(), DriverError>> + Send;

    /// Execute `sql` verbatim and collect every returned row.
    fn query(&self, sql: &str) -> impl Future<Output = Result<Vec<RawRow>, DriverError>> + Send;
}
