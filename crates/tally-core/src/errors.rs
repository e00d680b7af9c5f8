//! Cross-cutting error types for tally.
//!
//! Errors raised while decoding the harness's own inputs (credential stores,
//! snapshot documents, query lists). Driver, generation and scoring errors
//! live in their respective modules and crates.

use thiserror::Error;

/// A credential store or snapshot document could not be understood.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A non-blank credential line without a `:` separator or username.
    ///
    /// Only the line number is reported; the line may contain a password.
    #[error("malformed credential on line {line}: expected 'username:password'")]
    MalformedCredential { line: usize },

    /// The credential store holds no entries.
    #[error("no valid 'username:password' lines in credential store")]
    EmptyCredentialStore,

    /// The snapshot YAML could not be decoded.
    #[error("invalid snapshot document: {0}")]
    Snapshot(#[from] serde_yaml::Error),

    /// The snapshot holds no query test cases.
    #[error("no queries found in snapshot")]
    EmptySnapshot,

    /// A selected test case has no expected rows to compare against.
    #[error("no expected results for query: {query}")]
    NoExpectedRows { query: String },

    /// A query list file holds no statements.
    #[error("no queries found in query list")]
    EmptyQueryList,
}
