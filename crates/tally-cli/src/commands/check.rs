use std::sync::Arc;

use anyhow::Context;
use tally_config::TallyConfig;
use tally_db::LibsqlConnector;
use tally_score::{CheckReport, QueryRegistry, Scorer};

use crate::bootstrap::resolve_address;
use crate::cli::GlobalFlags;
use crate::output::output;

/// Handle `tally login`.
pub async fn handle_login(config: &TallyConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let scorer = build_scorer(config)?;
    let report = scorer.login_check(&resolve_address(flags, config)).await;
    finish(&report, flags)
}

/// Handle `tally query`.
pub async fn handle_query(config: &TallyConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    if !config.service.has_snapshots() {
        anyhow::bail!("service.snapshot_path is not configured; nothing to compare against");
    }
    let scorer = build_scorer(config)?;
    let report = scorer.query_check(&resolve_address(flags, config)).await;
    finish(&report, flags)
}

fn build_scorer(config: &TallyConfig) -> anyhow::Result<Scorer<LibsqlConnector>> {
    Scorer::from_config(
        LibsqlConnector::from_config(&config.service),
        config,
        Arc::new(QueryRegistry::new()),
    )
    .context("failed to prepare scorer")
}

/// Print the report; a failed check becomes a non-zero exit.
fn finish(report: &CheckReport, flags: &GlobalFlags) -> anyhow::Result<()> {
    output(report, flags.format)?;
    if report.success {
        return Ok(());
    }
    let reason = report.reason().unwrap_or_else(|| String::from("unknown"));
    anyhow::bail!("{} check failed: {reason}", report.check)
}
