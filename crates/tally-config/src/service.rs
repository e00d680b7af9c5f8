//! Configuration of the SQL service under test.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// How the service's database is reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Embedded database file opened in-process; `database` is the path.
    Local,
    /// Network server reached at `{scheme}://{address}:{port}`.
    #[default]
    Remote,
}

impl Backend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_name() -> String {
    String::from("sql")
}

fn default_scheme() -> String {
    String::from("http")
}

fn default_address() -> String {
    String::from("localhost")
}

const fn default_port() -> u16 {
    8080
}

/// Points awarded for a passing check.
const fn default_award() -> u32 {
    1
}

/// Connect + liveness probe deadline, in milliseconds.
const fn default_connect_timeout_ms() -> u64 {
    250
}

/// Query execution deadline, in milliseconds.
const fn default_query_timeout_ms() -> u64 {
    5000
}

#[derive(Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Display name used in logs and reports.
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default)]
    pub backend: Backend,

    /// URL scheme for the remote backend (`http`, `https`, `libsql`).
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Default host to score when the caller does not pass one.
    #[serde(default = "default_address")]
    pub address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name, or the database file path for the local backend.
    #[serde(default)]
    pub database: String,

    /// Fixed login user. When empty, users are drawn from `credentials_file`.
    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Credential store: one `username:password` per line.
    #[serde(default)]
    pub credentials_file: String,

    /// Snapshot directory (`<user>.yaml` per user) or a single `<user>.yaml`.
    #[serde(default)]
    pub snapshot_path: String,

    #[serde(default = "default_award")]
    pub award: u32,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            backend: Backend::default(),
            scheme: default_scheme(),
            address: default_address(),
            port: default_port(),
            database: String::new(),
            user: String::new(),
            password: String::new(),
            credentials_file: String::new(),
            snapshot_path: String::new(),
            award: default_award(),
            connect_timeout_ms: default_connect_timeout_ms(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("name", &self.name)
            .field("backend", &self.backend)
            .field("scheme", &self.scheme)
            .field("address", &self.address)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("credentials_file", &self.credentials_file)
            .field("snapshot_path", &self.snapshot_path)
            .field("award", &self.award)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("query_timeout_ms", &self.query_timeout_ms)
            .finish()
    }
}

impl ServiceConfig {
    /// A single login user is configured for every check.
    #[must_use]
    pub fn has_fixed_user(&self) -> bool {
        !self.user.is_empty()
    }

    /// Checks have some way to pick a credential.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.has_fixed_user() || !self.credentials_file.is_empty()
    }

    /// Query checks have snapshots to compare against.
    #[must_use]
    pub fn has_snapshots(&self) -> bool {
        !self.snapshot_path.is_empty()
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Reject values no check can run with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout_ms == 0 {
            return Err(invalid("service.connect_timeout_ms", "must be greater than zero"));
        }
        if self.query_timeout_ms == 0 {
            return Err(invalid("service.query_timeout_ms", "must be greater than zero"));
        }
        match self.backend {
            Backend::Remote if self.port == 0 => {
                Err(invalid("service.port", "remote backend needs a port"))
            }
            Backend::Remote if self.scheme.is_empty() => {
                Err(invalid("service.scheme", "remote backend needs a URL scheme"))
            }
            Backend::Local if self.database.is_empty() => Err(invalid(
                "service.database",
                "local backend needs a database file path",
            )),
            _ => Ok(()),
        }
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
