use std::path::Path;

use anyhow::Context;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tally_config::TallyConfig;
use tally_core::snapshot::QueryCase;
use tally_score::QueryRegistry;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SampleArgs;
use crate::output::output;

#[derive(Debug, Serialize)]
struct SampleResponse<'a> {
    user: &'a str,
    case: &'a QueryCase,
}

/// Handle `tally sample`.
pub fn handle(args: &SampleArgs, config: &TallyConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let service = &config.service;
    if !service.has_snapshots() {
        anyhow::bail!("service.snapshot_path is not configured");
    }

    let registry = QueryRegistry::new();
    registry
        .load(Path::new(&service.snapshot_path))
        .with_context(|| format!("failed to load snapshots from {}", service.snapshot_path))?;

    let mut rng = config
        .general
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

    let user = match (&args.user, service.has_fixed_user()) {
        (Some(user), _) => user.clone(),
        (None, true) => service.user.clone(),
        (None, false) => registry
            .users()
            .choose(&mut rng)
            .map(|user| (*user).to_string())
            .context("no users registered")?,
    };

    let snapshot = registry.load_snapshot(&user)?;
    let case = snapshot.choose_case(&mut rng)?;
    output(&SampleResponse { user: &user, case }, flags.format)
}
