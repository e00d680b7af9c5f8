//! Snapshot documents: captured queries with their expected rows.
//!
//! A snapshot is written once per service version and read on every scoring
//! run. It is never edited in place; regeneration replaces the whole file
//! (see [`write_atomic`]).

use std::io::Write as _;
use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::errors::ParseError;
use crate::normalize::Row;

/// A query together with the rows it returned at capture time.
///
/// The query text is kept verbatim so the scorer replays the identical
/// statement. Row order in `expected` carries no meaning for comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCase {
    pub query: String,
    #[serde(default)]
    pub expected: Vec<Row>,
}

/// The persisted set of query test cases for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub queries: Vec<QueryCase>,
}

impl SnapshotFile {
    /// Decode a snapshot from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Snapshot` if the document is not a valid snapshot.
    pub fn from_yaml_str(text: &str) -> Result<Self, ParseError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Encode the snapshot as YAML.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if a value cannot be encoded.
    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Pick one test case uniformly at random.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::EmptySnapshot` when there are no cases and
    /// `ParseError::NoExpectedRows` when the chosen case has nothing to
    /// compare against.
    pub fn choose_case<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&QueryCase, ParseError> {
        let case = self
            .queries
            .choose(rng)
            .ok_or(ParseError::EmptySnapshot)?;
        if case.expected.is_empty() {
            return Err(ParseError::NoExpectedRows {
                query: case.query.clone(),
            });
        }
        Ok(case)
    }
}

/// Write `contents` to `path`, replacing any existing file.
///
/// The bytes go to a temporary file in the destination directory which is
/// then renamed over `path`, so readers never observe a partial snapshot and
/// a failed write leaves the previous file untouched.
///
/// # Errors
///
/// Returns an I/O error if the temporary file cannot be created, written, or
/// persisted.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
