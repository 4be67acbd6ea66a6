//! Backend session lifecycle.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::iter::Take;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_retry::Retry;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, error, info, warn};

use crate::domain::backend::{BackendClient, BackendFailure, FailureKind};
use crate::domain::entities::{
    Credential, LoginCredentials, Session, SessionState, StaticTokenClaims,
};

/// How the manager obtains its credential.
#[derive(Debug, Clone)]
pub enum AuthMode {
    /// Pre-issued token, rotated outside the gateway.
    StaticToken,
    /// Username/password login performed and refreshed by the gateway.
    Interactive(LoginCredentials),
}

/// Login retry and refresh settings.
#[derive(Debug, Clone)]
pub struct LoginPolicy {
    /// Age after which a session is replaced by a fresh login.
    pub refresh_interval: Duration,
    /// Total login attempts per refresh, including the first.
    pub max_attempts: usize,
    /// Delay before the first retry; doubles per retry.
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Upper bound on a whole refresh, retries included.
    pub timeout: Duration,
}

impl Default for LoginPolicy {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(7 * 60 * 60),
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            timeout: Duration::from_secs(60),
        }
    }
}

impl LoginPolicy {
    /// Delays between attempts: `initial, 2*initial, 4*initial, ...` capped at
    /// `max_backoff`, one fewer than `max_attempts`.
    fn retry_delays(&self) -> Take<ExponentialBackoff> {
        let factor = (self.initial_backoff.as_millis() as u64 / 2).max(1);

        ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(self.max_backoff)
            .take(self.max_attempts.saturating_sub(1))
    }
}

/// Failure to establish a backend session.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("login failed: {0}")]
    LoginFailed(BackendFailure),
    #[error("login did not complete within {0:?}")]
    TimedOut(Duration),
}

/// Point-in-time view of the session for diagnostics.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub static_token: bool,
    pub tenant_id: Option<String>,
    pub region: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    /// True when the most recent login run gave up.
    pub last_login_failed: bool,
}

struct Inner {
    session: Session,
    last_outcome: Option<Result<Credential, SessionError>>,
}

/// Keeps a valid controller credential available to the query resolver.
///
/// All transitions happen behind one async mutex, so at most one login is in
/// flight. Callers that queued behind a login observe its outcome instead of
/// starting another one.
pub struct SessionManager {
    backend: Arc<dyn BackendClient>,
    mode: AuthMode,
    policy: LoginPolicy,
    inner: Mutex<Inner>,
    /// Number of completed login runs, successful or not.
    generation: AtomicU64,
}

impl SessionManager {
    /// Creates a manager that logs in on first use.
    pub fn interactive(
        backend: Arc<dyn BackendClient>,
        credentials: LoginCredentials,
        policy: LoginPolicy,
    ) -> Self {
        Self {
            backend,
            mode: AuthMode::Interactive(credentials),
            policy,
            inner: Mutex::new(Inner {
                session: Session::unauthenticated(),
                last_outcome: None,
            }),
            generation: AtomicU64::new(0),
        }
    }

    /// Creates a manager around a pre-issued credential. It never logs in.
    pub fn static_token(
        backend: Arc<dyn BackendClient>,
        credential: Credential,
        region: Option<String>,
    ) -> Self {
        Self {
            backend,
            mode: AuthMode::StaticToken,
            policy: LoginPolicy::default(),
            inner: Mutex::new(Inner {
                session: Session::with_static_token(
                    credential.token,
                    credential.tenant_id,
                    region,
                ),
                last_outcome: None,
            }),
            generation: AtomicU64::new(0),
        }
    }

    /// Builds a static-token manager from a pre-issued `token`.
    ///
    /// Tenant and region are decoded from the token itself, and the client is
    /// pointed at the token's region. Only tokens without embedded claims are
    /// resolved through the profile endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::LoginFailed`] if the token carries no tenant
    /// and the profile lookup fails.
    pub async fn from_static_token(
        backend: Arc<dyn BackendClient>,
        token: String,
    ) -> Result<Self, SessionError> {
        let (tenant_id, region) = match StaticTokenClaims::parse(&token) {
            Some(StaticTokenClaims {
                tenant_id: Some(tenant_id),
                region,
            }) => (tenant_id, region),
            _ => {
                debug!("Static token carries no tenant claim, asking the controller");
                let profile = backend
                    .get_profile(&token)
                    .await
                    .map_err(SessionError::LoginFailed)?;
                (profile.tenant_id, None)
            }
        };

        if let Some(region) = &region
            && let Err(e) = backend.refresh_region(region).await
        {
            warn!(region = %region, "Failed to apply static token region: {}", e);
        }

        info!(
            tenant_id = %tenant_id,
            region = region.as_deref().unwrap_or("default"),
            "Using static auth token"
        );

        Ok(Self::static_token(
            backend,
            Credential { token, tenant_id },
            region,
        ))
    }

    pub fn is_static(&self) -> bool {
        matches!(self.mode, AuthMode::StaticToken)
    }

    /// Returns a usable credential, logging in first when needed.
    ///
    /// A session younger than the refresh interval is returned without any
    /// backend call. Otherwise the current session is logged out (best
    /// effort) and a new login is attempted with bounded exponential backoff.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when every attempt fails or the login timeout
    /// elapses. Callers that were waiting on that same login get the same
    /// error.
    pub async fn ensure_authenticated(&self) -> Result<Credential, SessionError> {
        let credentials = match &self.mode {
            AuthMode::StaticToken => {
                let inner = self.inner.lock().await;
                return inner.session.credential.clone().ok_or_else(|| {
                    SessionError::LoginFailed(BackendFailure::new(
                        FailureKind::Unauthorized,
                        Value::String("static token missing".to_string()),
                    ))
                });
            }
            AuthMode::Interactive(credentials) => credentials,
        };

        let observed = self.generation.load(Ordering::Acquire);
        let mut inner = self.inner.lock().await;

        if inner.session.is_fresh(self.policy.refresh_interval)
            && let Some(credential) = &inner.session.credential
        {
            return Ok(credential.clone());
        }

        // A login finished while this caller waited for the lock.
        if self.generation.load(Ordering::Acquire) != observed
            && let Some(Err(e)) = &inner.last_outcome
        {
            return Err(e.clone());
        }

        if let Some(stale) = inner.session.credential.clone() {
            debug!("Session expired, logging out before refresh");
            if let Err(e) = self.backend.logout(&stale.token).await {
                debug!("Logout failed (ignored): {}", e);
            }
        }
        inner.session.clear();
        inner.session.state = SessionState::Authenticating;

        let outcome = self.login(credentials).await;

        match &outcome {
            Ok((credential, region)) => {
                info!(
                    tenant_id = %credential.tenant_id,
                    region = region.as_deref().unwrap_or("default"),
                    "Logged in to controller"
                );
                inner.session.establish(credential.clone(), region.clone());
            }
            Err(e) => {
                error!("Giving up on controller login: {}", e);
                inner.session.clear();
            }
        }

        let outcome = outcome.map(|(credential, _)| credential);
        inner.last_outcome = Some(outcome.clone());
        self.generation.fetch_add(1, Ordering::AcqRel);

        outcome
    }

    /// Runs the retrying login under the overall timeout.
    async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<(Credential, Option<String>), SessionError> {
        let mut attempt = 0usize;

        let retry = Retry::spawn(self.policy.retry_delays(), || {
            attempt += 1;
            self.login_once(credentials, attempt)
        });

        match tokio::time::timeout(self.policy.timeout, retry).await {
            Ok(Ok(established)) => Ok(established),
            Ok(Err(failure)) => Err(SessionError::LoginFailed(failure)),
            Err(_) => Err(SessionError::TimedOut(self.policy.timeout)),
        }
    }

    /// Credential exchange, region resolution and profile lookup.
    async fn login_once(
        &self,
        credentials: &LoginCredentials,
        attempt: usize,
    ) -> Result<(Credential, Option<String>), BackendFailure> {
        let result = async {
            let grant = self.backend.login(credentials).await?;

            if let Some(region) = &grant.region {
                self.backend.refresh_region(region).await?;
            }

            let profile = self.backend.get_profile(&grant.token).await?;

            Ok((
                Credential {
                    token: grant.token,
                    tenant_id: profile.tenant_id,
                },
                grant.region,
            ))
        }
        .await;

        if let Err(e) = &result {
            warn!(attempt, max_attempts = self.policy.max_attempts, "Login attempt failed: {}", e);
        }

        result
    }

    /// Marks the session unauthenticated after `rejected` was refused by the
    /// controller, forcing the next [`Self::ensure_authenticated`] to log in.
    ///
    /// Does nothing if the session already moved on to another credential.
    /// Static tokens cannot be renewed here; the rejection is only logged.
    pub async fn invalidate(&self, rejected: &Credential) {
        if self.is_static() {
            warn!("Controller rejected the static auth token");
            return;
        }

        let mut inner = self.inner.lock().await;
        if inner.session.credential.as_ref() == Some(rejected) {
            warn!("Controller rejected the session, forcing re-login");
            inner.session.clear();
        }
    }

    /// Current state for health reporting.
    ///
    /// Reports [`SessionState::Authenticating`] while a login holds the lock.
    pub fn snapshot(&self) -> SessionSnapshot {
        match self.inner.try_lock() {
            Ok(inner) => SessionSnapshot {
                state: inner.session.state,
                static_token: self.is_static(),
                tenant_id: inner
                    .session
                    .credential
                    .as_ref()
                    .map(|c| c.tenant_id.clone()),
                region: inner.session.region.clone(),
                last_login_at: inner.session.last_login_wall,
                last_login_failed: matches!(inner.last_outcome, Some(Err(_))),
            },
            Err(_) => SessionSnapshot {
                state: SessionState::Authenticating,
                static_token: self.is_static(),
                tenant_id: None,
                region: None,
                last_login_at: None,
                last_login_failed: false,
            },
        }
    }
}
