use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tally_core::credential::{CredentialStore, extract_from_sql_dump};
use tally_core::snapshot::write_atomic;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ExtractUsersArgs;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ExtractUsersResponse {
    output: String,
    users: Vec<String>,
}

/// Handle `tally extract-users`.
pub fn handle(args: &ExtractUsersArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let dump = std::fs::read_to_string(&args.dump)
        .with_context(|| format!("failed to read SQL dump {}", args.dump))?;

    let store = CredentialStore::from_entries(extract_from_sql_dump(&dump));
    if store.is_empty() {
        anyhow::bail!("no CREATE USER statements found in {}", args.dump);
    }

    write_atomic(Path::new(&args.output), &store.to_lines())
        .with_context(|| format!("failed to write credential store {}", args.output))?;

    let response = ExtractUsersResponse {
        output: args.output.clone(),
        users: store
            .entries()
            .iter()
            .map(|credential| credential.username.clone())
            .collect(),
    };
    output(&response, flags.format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;

    fn flags() -> GlobalFlags {
        GlobalFlags {
            format: OutputFormat::Raw,
            quiet: true,
            verbose: false,
            config: None,
            address: None,
        }
    }

    #[test]
    fn writes_store_that_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dir.path().join("dump.sql");
        let store = dir.path().join("users.txt");
        std::fs::write(
            &dump,
            "CREATE USER 'alice'@'%' IDENTIFIED BY 'pw:1';\nCREATE USER 'bob'@'localhost' IDENTIFIED BY 'pw2';\n",
        )
        .unwrap();

        let args = ExtractUsersArgs {
            dump: dump.to_string_lossy().into_owned(),
            output: store.to_string_lossy().into_owned(),
        };
        handle(&args, &flags()).unwrap();

        let parsed = CredentialStore::parse(&std::fs::read_to_string(&store).unwrap()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.entries()[0].password, "pw:1");
    }

    #[test]
    fn dump_without_users_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dir.path().join("dump.sql");
        std::fs::write(&dump, "CREATE TABLE t (x INT);").unwrap();
        let args = ExtractUsersArgs {
            dump: dump.to_string_lossy().into_owned(),
            output: dir.path().join("users.txt").to_string_lossy().into_owned(),
        };
        assert!(handle(&args, &flags()).is_err());
        assert!(!dir.path().join("users.txt").exists());
    }
}
