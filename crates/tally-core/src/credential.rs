//! Credential store parsing and selection.
//!
//! A store is a line-oriented text file, one `username:password` pair per
//! line. Blank lines are skipped; everything else must parse.

use std::fmt;
use std::sync::LazyLock;

use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;

use crate::errors::ParseError;

/// One login for the service under test.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Render as a store line.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!("{}:{}", self.username, self.password)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// All credentials parsed from one store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialStore {
    entries: Vec<Credential>,
}

impl CredentialStore {
    /// Parse store text.
    ///
    /// Lines are trimmed. The password is everything after the first `:`, so
    /// it may itself contain colons.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MalformedCredential` for a non-blank line without
    /// `:` or with an empty username, and `ParseError::EmptyCredentialStore`
    /// if no entries remain.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut entries = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (username, password) = line
                .split_once(':')
                .filter(|(user, _)| !user.is_empty())
                .ok_or(ParseError::MalformedCredential { line: idx + 1 })?;
            entries.push(Credential::new(username, password));
        }
        if entries.is_empty() {
            return Err(ParseError::EmptyCredentialStore);
        }
        Ok(Self { entries })
    }

    #[must_use]
    pub fn from_entries(entries: Vec<Credential>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[Credential] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pick one entry uniformly at random.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Credential> {
        self.entries.choose(rng)
    }

    /// Render back to store text, one entry per line.
    #[must_use]
    pub fn to_lines(&self) -> String {
        self.entries
            .iter()
            .map(Credential::to_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `CREATE USER 'name'@'host' IDENTIFIED BY 'password'`, with non-empty
/// name and password.
static CREATE_USER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)create\s+user\s+'([^']+)'@'[^']*'\s+identified\s+by\s+'([^']+)'")
        .expect("CREATE USER pattern is valid")
});

/// Extract credentials from `CREATE USER` statements in a SQL dump.
///
/// Keywords are case-insensitive and any whitespace may separate tokens.
/// Matches are returned in order of appearance. Statements in any other
/// shape, or with an empty user or password, are ignored.
#[must_use]
pub fn extract_from_sql_dump(sql: &str) -> Vec<Credential> {
    CREATE_USER
        .captures_iter(sql)
        .map(|caps| Credential::new(&caps[1], &caps[2]))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn skips_blank_lines() {
        let store = CredentialStore::parse("alice:pw1\n\nbob:pw2\n").unwrap();
        assert_eq!(
            store.entries(),
            &[Credential::new("alice", "pw1"), Credential::new("bob", "pw2")]
        );
    }

    #[test]
    fn trims_whitespace_and_crlf() {
        let store = CredentialStore::parse("  alice:pw1  \r\n\t\r\n").unwrap();
        assert_eq!(store.entries(), &[Credential::new("alice", "pw1")]);
    }

    #[test]
    fn password_may_contain_colons() {
        let store = CredentialStore::parse("svc:a:b:c").unwrap();
        assert_eq!(store.entries()[0].password, "a:b:c");
    }

    #[test]
    fn empty_password_is_allowed() {
        let store = CredentialStore::parse("guest:").unwrap();
        assert_eq!(store.entries()[0], Credential::new("guest", ""));
    }

    #[test]
    fn line_without_colon_is_a_hard_error() {
        let err = CredentialStore::parse("alice:pw1\nbroken\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedCredential { line: 2 }));
        assert!(!err.to_string().contains("broken"));
    }

    #[test]
    fn empty_username_is_rejected() {
        let err = CredentialStore::parse(":secret").unwrap_err();
        assert!(matches!(err, ParseError::MalformedCredential { line: 1 }));
    }

    #[test]
    fn blank_store_is_empty_error() {
        let err = CredentialStore::parse("\n  \n").unwrap_err();
        assert!(matches!(err, ParseError::EmptyCredentialStore));
    }

    #[test]
    fn choose_covers_every_entry() {
        let store = CredentialStore::parse("a:1\nb:2\nc:3").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(store.choose(&mut rng).unwrap().username.clone());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn debug_redacts_password() {
        let rendered = format!("{:?}", Credential::new("alice", "hunter2"));
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn extracts_create_user_statements() {
        let dump = "\
CREATE DATABASE minecraft;
CREATE USER 'steve'@'%' IDENTIFIED BY 'diamond';
GRANT SELECT ON minecraft.* TO 'steve'@'%';
create user 'alex'@'localhost'   identified by 'emerald'; CREATE USER 'nopass'@'%';
";
        let found = extract_from_sql_dump(dump);
        assert_eq!(
            found,
            vec![
                Credential::new("steve", "diamond"),
                Credential::new("alex", "emerald"),
            ]
        );
        assert_eq!(
            CredentialStore::from_entries(found).to_lines(),
            "steve:diamond\nalex:emerald"
        );
    }

    #[test]
    fn extracted_users_round_trip_through_the_store() {
        let dump = "\
CREATE USER ''@'%' IDENTIFIED BY 'x';
CREATE USER 'carol'@'%' IDENTIFIED BY '';
CREATE USER 'bob'@'%' IDENTIFIED BY 'pw';
";
        let found = extract_from_sql_dump(dump);
        assert_eq!(found, vec![Credential::new("bob", "pw")]);

        let text = CredentialStore::from_entries(found).to_lines();
        let store = CredentialStore::parse(&text).unwrap();
        assert_eq!(store.entries(), &[Credential::new("bob", "pw")]);
    }
}
