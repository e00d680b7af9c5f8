//! Snapshot generation: run each query against a reference database and
//! capture the normalized results.

use std::path::Path;

use tally_core::credential::Credential;
use tally_core::driver::{ConnectionTarget, Connector, DriverError, SqlConnection};
use tally_core::errors::ParseError;
use tally_core::normalize::normalize_rows;
use tally_core::snapshot::{QueryCase, SnapshotFile, write_atomic};

use crate::error::GenerateError;

/// Split query list text into statements: one per line, trimmed, blank
/// lines skipped.
#[must_use]
pub fn parse_query_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read a query list file.
///
/// # Errors
///
/// Returns `GenerateError::Io` if the file cannot be read and
/// `GenerateError::Parse` if it holds no statements.
pub fn read_query_list(path: &Path) -> Result<Vec<String>, GenerateError> {
    let text = std::fs::read_to_string(path)?;
    let queries = parse_query_list(&text);
    if queries.is_empty() {
        return Err(ParseError::EmptyQueryList.into());
    }
    Ok(queries)
}

/// Execute each query in order on `conn` and capture its rows.
///
/// Query text is stored verbatim. The first failing query aborts the run.
///
/// # Errors
///
/// Returns `GenerateError::QueryExecution` naming the failing query.
pub async fn generate<S: SqlConnection>(
    conn: &S,
    queries: &[String],
) -> Result<SnapshotFile, GenerateError> {
    let mut snapshot = SnapshotFile::default();
    for (idx, query) in queries.iter().enumerate() {
        tracing::debug!(index = idx, %query, "capturing query");
        let raw = conn
            .query(query)
            .await
            .map_err(|source| GenerateError::QueryExecution {
                query: query.clone(),
                source,
            })?;
        snapshot.queries.push(QueryCase {
            query: query.clone(),
            expected: normalize_rows(raw),
        });
    }
    Ok(snapshot)
}

/// Connect, capture every query, and write the snapshot to `output`.
///
/// The write is atomic; on any error nothing is written and an existing
/// file at `output` is left as it was.
///
/// # Errors
///
/// Returns `GenerateError::Connection` or `GenerateError::Timeout` if the
/// reference database cannot be reached within `target.connect_timeout`,
/// `GenerateError::QueryExecution` for a failing query, and
/// `GenerateError::Serialization` / `GenerateError::Io` if the snapshot
/// cannot be written.
pub async fn generate_to_file<C: Connector>(
    connector: &C,
    target: &ConnectionTarget,
    credential: &Credential,
    queries: &[String],
    output: &Path,
) -> Result<SnapshotFile, GenerateError> {
    let conn = tokio::time::timeout(target.connect_timeout, async {
        let conn = connector.connect(target, credential).await?;
        conn.ping().await?;
        Ok::<_, DriverError>(conn)
    })
    .await
    .map_err(|_| GenerateError::Timeout(target.connect_timeout))?
    .map_err(GenerateError::Connection)?;

    let snapshot = generate(&conn, queries).await?;
    let yaml = snapshot.to_yaml_string()?;
    write_atomic(output, &yaml)?;

    tracing::info!(
        queries = snapshot.queries.len(),
        output = %output.display(),
        user = %credential.username,
        "snapshot written"
    );
    Ok(snapshot)
}
