//! libSQL implementation of the driver seam.

use std::path::Path;

use libsql::Builder;
use tally_config::{Backend, ServiceConfig};
use tally_core::credential::Credential;
use tally_core::driver::{ConnectionTarget, Connector, DriverError, SqlConnection};
use tally_core::normalize::RawRow;

use crate::helpers::to_raw_value;

const IN_MEMORY: &str = ":memory:";

/// Opens libSQL connections, either to a local database file or to a
/// remote `sqld`/Turso server.
#[derive(Debug, Clone)]
pub struct LibsqlConnector {
    backend: Backend,
    scheme: String,
}

impl LibsqlConnector {
    #[must_use]
    pub fn new(backend: Backend, scheme: impl Into<String>) -> Self {
        Self {
            backend,
            scheme: scheme.into(),
        }
    }

    /// A connector for a local database file. Credentials are not checked.
    #[must_use]
    pub fn local() -> Self {
        Self::new(Backend::Local, "")
    }

    #[must_use]
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.backend, config.scheme.clone())
    }

    /// URL of a remote target, `{scheme}://{address}:{port}`.
    #[must_use]
    pub fn remote_url(&self, target: &ConnectionTarget) -> String {
        format!("{}://{}:{}", self.scheme, target.address, target.port)
    }

    async fn open(
        &self,
        target: &ConnectionTarget,
        credential: &Credential,
    ) -> Result<libsql::Database, DriverError> {
        match self.backend {
            Backend::Local => {
                let path = target.database.as_str();
                // Builder::new_local would silently create a fresh, empty file.
                if path != IN_MEMORY && !Path::new(path).exists() {
                    return Err(DriverError::Connect(format!(
                        "database file not found: {path}"
                    )));
                }
                Builder::new_local(path)
                    .build()
                    .await
                    .map_err(|e| DriverError::Connect(e.to_string()))
            }
            Backend::Remote => {
                let url = self.remote_url(target);
                tracing::debug!(%url, user = %credential.username, "opening remote database");
                Builder::new_remote(url, credential.password.clone())
                    .build()
                    .await
                    .map_err(|e| DriverError::Connect(e.to_string()))
            }
        }
    }
}

impl Connector for LibsqlConnector {
    type Connection = LibsqlConnection;

    async fn connect(
        &self,
        target: &ConnectionTarget,
        credential: &Credential,
    ) -> Result<Self::Connection, DriverError> {
        let db = self.open(target, credential).await?;
        let conn = db
            .connect()
            .map_err(|e| DriverError::Connect(e.to_string()))?;
        Ok(LibsqlConnection { _db: db, conn })
    }
}

/// A live libSQL connection. The database handle is kept alive alongside it.
pub struct LibsqlConnection {
    _db: libsql::Database,
    conn: libsql::Connection,
}

impl LibsqlConnection {
    /// Access the underlying libSQL connection for direct statements.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }
}

fn query_error(e: &libsql::Error) -> DriverError {
    DriverError::Query(e.to_string())
}

impl SqlConnection for LibsqlConnection {
    async fn ping(&self) -> Result<(), DriverError> {
        let mut rows = self
            .conn
            .query("SELECT 1", ())
            .await
            .map_err(|e| DriverError::Probe(e.to_string()))?;
        rows.next()
            .await
            .map_err(|e| DriverError::Probe(e.to_string()))?;
        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<Vec<RawRow>, DriverError> {
        let mut stmt = self.conn.prepare(sql).await.map_err(|e| query_error(&e))?;

        // Column metadata borrows the statement; take owned copies before
        // executing it.
        let columns: Vec<(String, Option<String>)> = stmt
            .columns()
            .iter()
            .map(|c| (c.name().to_string(), c.decl_type().map(str::to_string)))
            .collect();

        let mut rows = stmt.query(()).await.map_err(|e| query_error(&e))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| query_error(&e))? {
            let mut raw = Vec::with_capacity(columns.len());
            for (idx, (name, decl_type)) in columns.iter().enumerate() {
                let idx = i32::try_from(idx)
                    .map_err(|_| DriverError::Query(format!("column index {idx} out of range")))?;
                let value = row.get_value(idx).map_err(|e| query_error(&e))?;
                raw.push((name.clone(), to_raw_value(value, decl_type.as_deref())));
            }
            out.push(raw);
        }
        tracing::debug!(rows = out.len(), "query returned");
        Ok(out)
    }
}
