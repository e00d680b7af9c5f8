//! # tally-db
//!
//! libSQL database access for tally.
//!
//! Implements the driver seam from `tally-core` on top of libSQL, either an
//! embedded database file or a remote `sqld`/Turso server, and captures
//! snapshot files from a reference database.
//!
//! Uses the `libsql` crate (C `SQLite` fork, v0.9.29).

pub mod connector;
pub mod error;
pub mod helpers;
pub mod snapshot;

pub use connector::{LibsqlConnection, LibsqlConnector};
pub use error::GenerateError;
