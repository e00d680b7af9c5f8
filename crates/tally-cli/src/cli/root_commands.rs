use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Log in as a selected user and probe liveness.
    Login,
    /// Replay a snapshot query as a selected user and compare the results.
    Query,
    /// Capture a snapshot file from a reference database.
    Generate(GenerateArgs),
    /// Print a random test case from a user's snapshot.
    Sample(SampleArgs),
    /// Extract a credential store from `CREATE USER` statements in a SQL dump.
    ExtractUsers(ExtractUsersArgs),
}

impl Commands {
    /// Subcommand name as typed on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Query => "query",
            Self::Generate(_) => "generate",
            Self::Sample(_) => "sample",
            Self::ExtractUsers(_) => "extract-users",
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct GenerateArgs {
    /// Query list file: one SQL statement per line.
    #[arg(long)]
    pub queries: String,

    /// Snapshot file to write, conventionally `<user>.yaml`.
    #[arg(long)]
    pub output: String,

    /// Login user (defaults to `service.user`).
    #[arg(long)]
    pub user: Option<String>,

    /// Login password (defaults to `service.password`).
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct SampleArgs {
    /// User whose snapshot to sample (defaults to `service.user`, then a
    /// random registered user).
    #[arg(long)]
    pub user: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct ExtractUsersArgs {
    /// SQL dump to scan.
    #[arg(long)]
    pub dump: String,

    /// Credential store file to write.
    #[arg(long)]
    pub output: String,
}
