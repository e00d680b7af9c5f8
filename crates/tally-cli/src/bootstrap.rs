use std::path::Path;

use tally_config::TallyConfig;

use crate::cli::GlobalFlags;

/// Load configuration, picking up `.env` and the `--config` file.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<TallyConfig> {
    let extra = flags.config.as_deref().map(Path::new);
    let config = TallyConfig::load_with_dotenv(extra)?;
    tracing::debug!(
        service = %config.service.name,
        backend = %config.service.backend,
        "configuration loaded"
    );
    Ok(config)
}

/// Address to check: `--address`, else `service.address`.
pub fn resolve_address(flags: &GlobalFlags, config: &TallyConfig) -> String {
    flags
        .address
        .clone()
        .unwrap_or_else(|| config.service.address.clone())
}
