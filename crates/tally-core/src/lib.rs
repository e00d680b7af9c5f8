//! # tally-core
//!
//! Core types for the tally SQL scoring harness.
//!
//! This crate provides the pieces shared by the snapshot generator and the
//! scorer:
//! - Typed column values with an explicit kind tag
//! - Row normalization from driver-native values
//! - Order-insensitive result-set matching
//! - Snapshot documents (YAML) and atomic snapshot writes
//! - Credential store parsing and selection
//! - The check lifecycle state machine
//! - The database driver seam traits

pub mod credential;
pub mod driver;
pub mod errors;
pub mod matcher;
pub mod normalize;
pub mod phase;
pub mod snapshot;
pub mod value;
