//! Shared test utilities for tally-score unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tally_core::credential::Credential;
use tally_core::driver::{ConnectionTarget, Connector, DriverError, SqlConnection};
use tally_core::normalize::{RawRow, RawValue, normalize_rows};
use tally_core::snapshot::{QueryCase, SnapshotFile};
use tempfile::TempDir;

use crate::registry::QueryRegistry;

/// Scriptable in-process connector. Every connection returns `rows` for any
/// query.
#[derive(Default)]
pub struct FakeConnector {
    pub rows: Vec<RawRow>,
    pub refuse: bool,
    pub reject_queries: bool,
    pub connect_delay: Duration,
    pub query_delay: Duration,
    pub(crate) connects: AtomicUsize,
    pub(crate) queries: Arc<AtomicUsize>,
}

impl FakeConnector {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn queries_run(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl Connector for FakeConnector {
    type Connection = FakeConnection;

    async fn connect(
        &self,
        _target: &ConnectionTarget,
        _credential: &Credential,
    ) -> Result<FakeConnection, DriverError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.connect_delay).await;
        if self.refuse {
            return Err(DriverError::Connect("access denied".into()));
        }
        Ok(FakeConnection {
            rows: self.rows.clone(),
            reject: self.reject_queries,
            delay: self.query_delay,
            queries: Arc::clone(&self.queries),
        })
    }
}

pub struct FakeConnection {
    rows: Vec<RawRow>,
    reject: bool,
    delay: Duration,
    pub(crate) queries: Arc<AtomicUsize>,
}

impl SqlConnection for FakeConnection {
    async fn ping(&self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn query(&self, _sql: &str) -> Result<Vec<RawRow>, DriverError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.reject {
            return Err(DriverError::Query("syntax error".into()));
        }
        Ok(self.rows.clone())
    }
}

pub fn int_row(n: i64) -> RawRow {
    vec![("n".to_string(), RawValue::I64(n))]
}

/// Write a one-case snapshot for `user` and load it into a fresh registry.
pub fn snapshot_registry(user: &str, expected: &[RawRow]) -> (TempDir, Arc<QueryRegistry>) {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = SnapshotFile {
        queries: vec![QueryCase {
            query: "SELECT n FROM numbers".into(),
            expected: normalize_rows(expected.to_vec()),
        }],
    };
    std::fs::write(
        dir.path().join(format!("{user}.yaml")),
        snapshot.to_yaml_string().unwrap(),
    )
    .unwrap();
    let registry = QueryRegistry::new();
    registry.load(dir.path()).unwrap();
    (dir, Arc::new(registry))
}
