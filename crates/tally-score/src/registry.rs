//! Query registry: which snapshot file belongs to which user.
//!
//! Snapshots are stored one per user as `<user>.yaml`. The registry is
//! populated at most once from either a directory of such files or a single
//! file, then shared read-only between checks.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tally_core::snapshot::SnapshotFile;
use thiserror::Error;

use crate::error::ScoreError;

const SNAPSHOT_EXTENSION: &str = "yaml";

#[derive(Debug, Error)]
pub enum RegistryError {
    /// A lookup happened before any successful [`QueryRegistry::load`].
    #[error("query registry has not been loaded")]
    NotLoaded,

    #[error("no snapshot registered for user '{user}'")]
    UnknownUser { user: String },

    /// The load path is neither a `.yaml` file nor a directory holding any.
    #[error("invalid snapshot path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: &'static str },

    #[error("failed to scan snapshot path: {0}")]
    Io(#[from] std::io::Error),
}

/// User to snapshot file mapping, populated once.
#[derive(Debug, Default)]
pub struct QueryRegistry {
    entries: OnceLock<HashMap<String, PathBuf>>,
}

impl QueryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the registry from `path`, a directory or a single
    /// `<user>.yaml` file.
    ///
    /// Only the first successful load takes effect. Later calls, including
    /// concurrent ones that lose the race, return the entry count already in
    /// place. A failed load leaves the registry empty so it can be retried.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidPath` for a path that yields no
    /// snapshot files and `RegistryError::Io` if the directory cannot be read.
    pub fn load(&self, path: &Path) -> Result<usize, RegistryError> {
        if let Some(entries) = self.entries.get() {
            return Ok(entries.len());
        }
        let scanned = scan(path)?;
        let entries = self.entries.get_or_init(|| scanned);
        tracing::debug!(path = %path.display(), users = entries.len(), "query registry loaded");
        Ok(entries.len())
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.entries.get().is_some()
    }

    /// Number of registered users; zero before loading.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.get().map_or(0, HashMap::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered user names, sorted.
    #[must_use]
    pub fn users(&self) -> Vec<&str> {
        let mut users: Vec<&str> = self
            .entries
            .get()
            .map(|entries| entries.keys().map(String::as_str).collect())
            .unwrap_or_default();
        users.sort_unstable();
        users
    }

    /// Snapshot file for `user`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotLoaded` before a successful load and
    /// `RegistryError::UnknownUser` for a user without a snapshot.
    pub fn snapshot_path(&self, user: &str) -> Result<&Path, RegistryError> {
        let entries = self.entries.get().ok_or(RegistryError::NotLoaded)?;
        entries
            .get(user)
            .map(PathBuf::as_path)
            .ok_or_else(|| RegistryError::UnknownUser {
                user: user.to_string(),
            })
    }

    /// Read and decode the snapshot registered for `user`.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::Registry` if the user has no snapshot,
    /// `ScoreError::Io` if the file cannot be read and `ScoreError::Parse`
    /// if it is not a valid snapshot.
    pub fn load_snapshot(&self, user: &str) -> Result<SnapshotFile, ScoreError> {
        let path = self.snapshot_path(user)?;
        let text = std::fs::read_to_string(path)?;
        Ok(SnapshotFile::from_yaml_str(&text)?)
    }
}

fn scan(path: &Path) -> Result<HashMap<String, PathBuf>, RegistryError> {
    let mut entries = HashMap::new();
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let file = entry?.path();
            if !file.is_file() {
                continue;
            }
            if let Some(user) = snapshot_user(&file) {
                entries.insert(user, file);
            }
        }
        if entries.is_empty() {
            return Err(RegistryError::InvalidPath {
                path: path.to_path_buf(),
                reason: "directory holds no .yaml snapshot files",
            });
        }
    } else if path.is_file() {
        let user = snapshot_user(path).ok_or_else(|| RegistryError::InvalidPath {
            path: path.to_path_buf(),
            reason: "snapshot file must be named <user>.yaml",
        })?;
        entries.insert(user, path.to_path_buf());
    } else {
        return Err(RegistryError::InvalidPath {
            path: path.to_path_buf(),
            reason: "no such file or directory",
        });
    }
    Ok(entries)
}

/// `<user>.yaml` -> `user`.
fn snapshot_user(path: &Path) -> Option<String> {
    if path.extension()? != SNAPSHOT_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const SNAPSHOT: &str = "queries:\n- query: SELECT 1 AS n\n  expected:\n  - n:\n      type: integer\n      value: 1\n";

    fn snapshot_dir(users: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for user in users {
            std::fs::write(dir.path().join(format!("{user}.yaml")), SNAPSHOT).unwrap();
        }
        dir
    }

    #[test]
    fn loads_every_yaml_in_directory() {
        let dir = snapshot_dir(&["alice", "bob"]);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = QueryRegistry::new();
        assert_eq!(registry.load(dir.path()).unwrap(), 2);
        assert_eq!(registry.users(), ["alice", "bob"]);
        assert!(registry.snapshot_path("alice").unwrap().ends_with("alice.yaml"));
    }

    #[test]
    fn loads_single_file() {
        let dir = snapshot_dir(&["carol"]);
        let registry = QueryRegistry::new();
        assert_eq!(registry.load(&dir.path().join("carol.yaml")).unwrap(), 1);
        assert_eq!(registry.users(), ["carol"]);
    }

    #[test]
    fn second_load_is_a_no_op() {
        let first = snapshot_dir(&["alice"]);
        let second = snapshot_dir(&["bob", "carol"]);

        let registry = QueryRegistry::new();
        assert_eq!(registry.load(first.path()).unwrap(), 1);
        assert_eq!(registry.load(second.path()).unwrap(), 1);
        assert_eq!(registry.users(), ["alice"]);
    }

    #[test]
    fn failed_load_can_be_retried() {
        let registry = QueryRegistry::new();
        let err = registry.load(Path::new("/no/such/snapshots")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPath { .. }));
        assert!(!registry.is_loaded());

        let dir = snapshot_dir(&["alice"]);
        assert_eq!(registry.load(dir.path()).unwrap(), 1);
    }

    #[test]
    fn empty_directory_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let registry = QueryRegistry::new();
        assert!(matches!(
            registry.load(dir.path()),
            Err(RegistryError::InvalidPath { .. })
        ));
    }

    #[test]
    fn non_yaml_file_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alice.json");
        std::fs::write(&path, "{}").unwrap();
        assert!(matches!(
            QueryRegistry::new().load(&path),
            Err(RegistryError::InvalidPath { .. })
        ));
    }

    #[test]
    fn lookups_before_load_fail() {
        let registry = QueryRegistry::new();
        assert!(matches!(
            registry.snapshot_path("alice"),
            Err(RegistryError::NotLoaded)
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_user_is_reported() {
        let dir = snapshot_dir(&["alice"]);
        let registry = QueryRegistry::new();
        registry.load(dir.path()).unwrap();
        assert!(matches!(
            registry.snapshot_path("mallory"),
            Err(RegistryError::UnknownUser { ref user }) if user == "mallory"
        ));
    }

    #[test]
    fn load_snapshot_decodes_file() {
        let dir = snapshot_dir(&["alice"]);
        let registry = QueryRegistry::new();
        registry.load(dir.path()).unwrap();
        let snapshot = registry.load_snapshot("alice").unwrap();
        assert_eq!(snapshot.queries.len(), 1);
        assert_eq!(snapshot.queries[0].query, "SELECT 1 AS n");
    }

    #[test]
    fn concurrent_loads_populate_once() {
        let dirs: Vec<_> = (0..4)
            .map(|i| {
                let users: Vec<String> = (0..=i).map(|u| format!("user{u}")).collect();
                let refs: Vec<&str> = users.iter().map(String::as_str).collect();
                snapshot_dir(&refs)
            })
            .collect();
        let registry = Arc::new(QueryRegistry::new());

        let counts: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = dirs
                .iter()
                .map(|dir| {
                    let registry = Arc::clone(&registry);
                    scope.spawn(move || registry.load(dir.path()).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        // Every caller sees the same winning mapping.
        let winner = registry.len();
        assert!(counts.iter().all(|&c| c == winner));
    }
}
