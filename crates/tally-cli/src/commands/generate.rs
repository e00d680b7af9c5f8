use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tally_config::TallyConfig;
use tally_core::credential::Credential;
use tally_core::driver::ConnectionTarget;
use tally_db::LibsqlConnector;
use tally_db::snapshot::{generate_to_file, read_query_list};

use crate::bootstrap::resolve_address;
use crate::cli::GlobalFlags;
use crate::cli::root_commands::GenerateArgs;
use crate::output::output;

#[derive(Debug, Serialize)]
struct GenerateResponse {
    output: String,
    user: String,
    queries: usize,
    rows: usize,
}

/// Handle `tally generate`.
pub async fn handle(
    args: &GenerateArgs,
    config: &TallyConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let queries = read_query_list(Path::new(&args.queries))
        .with_context(|| format!("failed to read query list {}", args.queries))?;

    let service = &config.service;
    let credential = Credential::new(
        args.user.clone().unwrap_or_else(|| service.user.clone()),
        args.password
            .clone()
            .unwrap_or_else(|| service.password.clone()),
    );
    let target = ConnectionTarget {
        address: resolve_address(flags, config),
        port: service.port,
        database: service.database.clone(),
        connect_timeout: service.connect_timeout(),
    };

    let snapshot = generate_to_file(
        &LibsqlConnector::from_config(service),
        &target,
        &credential,
        &queries,
        Path::new(&args.output),
    )
    .await
    .with_context(|| format!("failed to generate snapshot {}", args.output))?;

    let response = GenerateResponse {
        output: args.output.clone(),
        user: credential.username,
        queries: snapshot.queries.len(),
        rows: snapshot.queries.iter().map(|case| case.expected.len()).sum(),
    };
    output(&response, flags.format)
}
