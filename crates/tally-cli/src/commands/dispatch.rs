use anyhow::Context;
use tally_config::TallyConfig;

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;

/// Dispatch a parsed command to the corresponding handler module.
///
/// Configuration is loaded only for commands that talk to a service;
/// `extract-users` runs without it.
pub async fn dispatch(command: Commands, flags: &GlobalFlags) -> anyhow::Result<()> {
    tracing::debug!(command = command.name(), "dispatching command");
    match command {
        Commands::ExtractUsers(args) => commands::extract_users::handle(&args, flags),
        Commands::Login => commands::check::handle_login(&config(flags)?, flags).await,
        Commands::Query => commands::check::handle_query(&config(flags)?, flags).await,
        Commands::Generate(args) => {
            commands::generate::handle(&args, &config(flags)?, flags).await
        }
        Commands::Sample(args) => commands::sample::handle(&args, &config(flags)?, flags),
    }
}

fn config(flags: &GlobalFlags) -> anyhow::Result<TallyConfig> {
    bootstrap::load_config(flags).context("failed to load tally configuration")
}
