//! The scoring driver.
//!
//! Each check runs on its own fresh connection and walks the
//! [`CheckPhase`] lifecycle once. Failures are terminal; nothing is retried
//! within a check. The only state shared between concurrent checks is the
//! read-only [`QueryRegistry`] and the RNG, which is locked just long enough
//! to make a selection.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tally_config::{ServiceConfig, TallyConfig};
use tally_core::credential::{Credential, CredentialStore};
use tally_core::driver::{ConnectionTarget, Connector, DriverError, SqlConnection};
use tally_core::errors::ParseError;
use tally_core::matcher::{MismatchError, compare_rows};
use tally_core::normalize::normalize_rows;
use tally_core::phase::CheckPhase;

use crate::error::ScoreError;
use crate::registry::QueryRegistry;
use crate::report::{CheckKind, CheckReport};

/// Where check credentials come from.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// The same login for every check.
    Fixed(Credential),
    /// A uniformly random login from an already-parsed store.
    Store(CredentialStore),
    /// A uniformly random login from a store file, re-read for every check
    /// so edits take effect and a malformed file fails the check itself.
    File(PathBuf),
}

impl CredentialSource {
    /// Build from the service config: a fixed user if one is configured,
    /// otherwise the credential store file.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::Parse` if neither is configured.
    pub fn from_config(service: &ServiceConfig) -> Result<Self, ScoreError> {
        if service.has_fixed_user() {
            return Ok(Self::Fixed(Credential::new(
                service.user.clone(),
                service.password.clone(),
            )));
        }
        if !service.has_credentials() {
            return Err(ParseError::EmptyCredentialStore.into());
        }
        Ok(Self::File(PathBuf::from(&service.credentials_file)))
    }
}

/// Runs login and query checks against services reachable through `C`.
///
/// `Scorer` is `Send + Sync` whenever the connector is, so one instance can
/// serve many concurrent checks.
pub struct Scorer<C> {
    connector: C,
    service: ServiceConfig,
    credentials: CredentialSource,
    registry: Arc<QueryRegistry>,
    rng: Mutex<StdRng>,
}

impl<C: Connector> Scorer<C> {
    #[must_use]
    pub fn new(
        connector: C,
        service: ServiceConfig,
        credentials: CredentialSource,
        registry: Arc<QueryRegistry>,
    ) -> Self {
        Self {
            connector,
            service,
            credentials,
            registry,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Build a scorer from loaded configuration. Loads the registry from
    /// `service.snapshot_path` when one is configured and seeds the RNG from
    /// `general.seed`.
    ///
    /// # Errors
    ///
    /// Returns the credential source error, or `ScoreError::Registry` if the
    /// snapshot path cannot be loaded.
    pub fn from_config(
        connector: C,
        config: &TallyConfig,
        registry: Arc<QueryRegistry>,
    ) -> Result<Self, ScoreError> {
        let credentials = CredentialSource::from_config(&config.service)?;
        if config.service.has_snapshots() {
            registry.load(Path::new(&config.service.snapshot_path))?;
        }
        let scorer = Self::new(connector, config.service.clone(), credentials, registry);
        Ok(match config.general.seed {
            Some(seed) => scorer.with_seed(seed),
            None => scorer,
        })
    }

    /// Make credential and test-case selection reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Connect as a selected user and probe liveness. No query is run.
    pub async fn login_check(&self, address: &str) -> CheckReport {
        let mut run = CheckRun::new(CheckKind::Login, address, self.service.award);

        let credential = match self.pick_credential() {
            Ok(credential) => credential,
            Err(e) => return run.fail(e),
        };
        run.user = Some(credential.username.clone());

        run.advance(CheckPhase::Connecting);
        let conn = match self.connect(address, &credential).await {
            Ok(conn) => conn,
            Err(e) => return run.fail(e),
        };
        run.advance(CheckPhase::Connected);
        drop(conn);

        run.succeed()
    }

    /// Connect as a selected user, replay one of their snapshot queries and
    /// compare the live rows against the snapshot.
    pub async fn query_check(&self, address: &str) -> CheckReport {
        let mut run = CheckRun::new(CheckKind::Query, address, self.service.award);

        let credential = match self.pick_credential() {
            Ok(credential) => credential,
            Err(e) => return run.fail(e),
        };
        run.user = Some(credential.username.clone());

        run.advance(CheckPhase::Connecting);
        let conn = match self.connect(address, &credential).await {
            Ok(conn) => conn,
            Err(e) => return run.fail(e),
        };
        run.advance(CheckPhase::Connected);

        let case = match self.pick_case(&credential.username) {
            Ok(case) => case,
            Err(e) => return run.fail(e),
        };
        run.query = Some(case.query.clone());

        run.advance(CheckPhase::Executing);
        let timeout = self.service.query_timeout();
        let raw = match tokio::time::timeout(timeout, conn.query(&case.query)).await {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => return run.fail(ScoreError::QueryExecution(e)),
            Err(_) => {
                return run.fail(ScoreError::Timeout {
                    stage: "query",
                    after: timeout,
                });
            }
        };
        drop(conn);

        run.advance(CheckPhase::Comparing);
        let actual = normalize_rows(raw);
        match compare_rows(&case.expected, &actual) {
            Ok(()) => run.succeed(),
            Err(mismatch) => run.mismatch(mismatch),
        }
    }

    fn lock_rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pick_credential(&self) -> Result<Credential, ScoreError> {
        let reloaded;
        let store = match &self.credentials {
            CredentialSource::Fixed(credential) => return Ok(credential.clone()),
            CredentialSource::Store(store) => store,
            CredentialSource::File(path) => {
                reloaded = CredentialStore::parse(&std::fs::read_to_string(path)?)?;
                &reloaded
            }
        };
        let mut rng = self.lock_rng();
        store
            .choose(&mut *rng)
            .cloned()
            .ok_or_else(|| ParseError::EmptyCredentialStore.into())
    }

    fn pick_case(&self, user: &str) -> Result<tally_core::snapshot::QueryCase, ScoreError> {
        let snapshot = self.registry.load_snapshot(user)?;
        let mut rng = self.lock_rng();
        Ok(snapshot.choose_case(&mut *rng)?.clone())
    }

    fn target(&self, address: &str) -> ConnectionTarget {
        ConnectionTarget {
            address: address.to_string(),
            port: self.service.port,
            database: self.service.database.clone(),
            connect_timeout: self.service.connect_timeout(),
        }
    }

    /// Connect and probe within the connect timeout.
    async fn connect(
        &self,
        address: &str,
        credential: &Credential,
    ) -> Result<C::Connection, ScoreError> {
        let target = self.target(address);
        let attempt = async {
            let conn = self.connector.connect(&target, credential).await?;
            conn.ping().await?;
            Ok::<_, DriverError>(conn)
        };
        match tokio::time::timeout(target.connect_timeout, attempt).await {
            Ok(result) => result.map_err(ScoreError::Connection),
            Err(_) => Err(ScoreError::Timeout {
                stage: "connect",
                after: target.connect_timeout,
            }),
        }
    }
}

/// Phase bookkeeping for one check, consumed into its report.
struct CheckRun {
    check: CheckKind,
    address: String,
    award: u32,
    phase: CheckPhase,
    user: Option<String>,
    query: Option<String>,
}

impl CheckRun {
    fn new(check: CheckKind, address: &str, award: u32) -> Self {
        Self {
            check,
            address: address.to_string(),
            award,
            phase: CheckPhase::Idle,
            user: None,
            query: None,
        }
    }

    fn advance(&mut self, next: CheckPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid check transition {} -> {next}",
            self.phase
        );
        tracing::debug!(
            check = %self.check,
            address = %self.address,
            from = %self.phase,
            to = %next,
            "check phase transition"
        );
        self.phase = next;
    }

    fn succeed(mut self) -> CheckReport {
        self.advance(CheckPhase::Done);
        tracing::info!(
            check = %self.check,
            address = %self.address,
            user = self.user.as_deref().unwrap_or_default(),
            awarded = self.award,
            "check passed"
        );
        let awarded = self.award;
        self.into_report(awarded, None, None)
    }

    fn fail(mut self, error: ScoreError) -> CheckReport {
        let failed_in = self.phase;
        self.advance(CheckPhase::Failed);
        tracing::info!(
            check = %self.check,
            address = %self.address,
            phase = %failed_in,
            kind = %error.kind(),
            error = %error,
            "check failed"
        );
        self.into_report(0, Some(error), None)
    }

    fn mismatch(mut self, mismatch: MismatchError) -> CheckReport {
        self.advance(CheckPhase::Failed);
        tracing::warn!(
            check = %self.check,
            address = %self.address,
            user = self.user.as_deref().unwrap_or_default(),
            query = self.query.as_deref().unwrap_or_default(),
            %mismatch,
            "result mismatch"
        );
        self.into_report(0, None, Some(mismatch))
    }

    fn into_report(
        self,
        awarded: u32,
        error: Option<ScoreError>,
        mismatch: Option<MismatchError>,
    ) -> CheckReport {
        CheckReport {
            check: self.check,
            address: self.address,
            user: self.user,
            query: self.query,
            awarded,
            success: error.is_none() && mismatch.is_none(),
            phase: self.phase,
            error,
            mismatch,
        }
    }
}
