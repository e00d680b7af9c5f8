//! # tally-score
//!
//! Scores a SQL service by running checks against it.
//!
//! - A **login check** connects as a user drawn from the credential store
//!   and probes liveness.
//! - A **query check** additionally replays one of that user's snapshot
//!   queries and compares the live result with the snapshot, ignoring row
//!   order.
//!
//! Every check yields a [`CheckReport`]: the configured award on success,
//! or no award with either a [`ScoreError`] or a mismatch reason.

pub mod error;
pub mod registry;
pub mod report;
pub mod scorer;

#[cfg(test)]
mod test_support;

pub use error::{ErrorKind, ScoreError};
pub use registry::{QueryRegistry, RegistryError};
pub use report::{CheckKind, CheckReport};
pub use scorer::{CredentialSource, Scorer};
