//! Backend session state owned by the session manager.

use chrono::{DateTime, Utc};
use std::fmt;
use tokio::time::{Duration, Instant};

/// Lifecycle state of the backend session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
        }
    }
}

/// Opaque backend credential scoped to a tenant.
///
/// `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub tenant_id: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"***")
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

/// Claims embedded in a pre-issued controller token.
///
/// Static tokens look like `<key>-<percent-encoded claims>`, where the claims
/// are `name=value` pairs joined by `&`. `t.id` names the tenant and `region`
/// the controller region that issued the token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StaticTokenClaims {
    pub tenant_id: Option<String>,
    pub region: Option<String>,
}

impl StaticTokenClaims {
    /// Decodes the claims of `token` without contacting the controller.
    ///
    /// Returns `None` when the token does not carry a tenant id.
    ///
    /// # Examples
    ///
    /// ```
    /// use topology_gateway::domain::entities::StaticTokenClaims;
    ///
    /// let claims = StaticTokenClaims::parse("abc123-t.id%3D42%26region%3Dhood").unwrap();
    /// assert_eq!(claims.tenant_id.as_deref(), Some("42"));
    /// assert_eq!(claims.region.as_deref(), Some("hood"));
    /// ```
    pub fn parse(token: &str) -> Option<Self> {
        let (_, encoded) = token.split_once('-')?;
        let decoded = urlencoding::decode(encoded).ok()?;

        let mut claims = Self::default();
        for pair in decoded.split('&') {
            let mut parts = pair.split('=');
            let (Some(name), Some(value), None) = (parts.next(), parts.next(), parts.next())
            else {
                continue;
            };

            match name {
                "t.id" if !value.is_empty() => claims.tenant_id = Some(value.to_string()),
                "region" if !value.is_empty() => claims.region = Some(value.to_string()),
                _ => {}
            }
        }

        claims.tenant_id.is_some().then_some(claims)
    }
}

/// Interactive login credentials.
#[derive(Clone)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Current backend session.
///
/// Invariant: `credential` is `Some` exactly when `state` is
/// [`SessionState::Authenticated`].
#[derive(Debug, Clone)]
pub struct Session {
    pub state: SessionState,
    pub credential: Option<Credential>,
    pub region: Option<String>,
    /// Monotonic login time used for refresh decisions.
    pub last_login_at: Option<Instant>,
    /// Wall-clock login time, reported by the health endpoint.
    pub last_login_wall: Option<DateTime<Utc>>,
}

impl Session {
    /// A session that has never logged in.
    pub fn unauthenticated() -> Self {
        Self {
            state: SessionState::Unauthenticated,
            credential: None,
            region: None,
            last_login_at: None,
            last_login_wall: None,
        }
    }

    /// A session built from a pre-issued token.
    pub fn with_static_token(token: String, tenant_id: String, region: Option<String>) -> Self {
        Self {
            state: SessionState::Authenticated,
            credential: Some(Credential { token, tenant_id }),
            region,
            last_login_at: Some(Instant::now()),
            last_login_wall: Some(Utc::now()),
        }
    }

    /// Records a successful login.
    pub fn establish(&mut self, credential: Credential, region: Option<String>) {
        self.state = SessionState::Authenticated;
        self.credential = Some(credential);
        self.region = region;
        self.last_login_at = Some(Instant::now());
        self.last_login_wall = Some(Utc::now());
    }

    /// Drops the credential and returns to [`SessionState::Unauthenticated`].
    pub fn clear(&mut self) {
        self.state = SessionState::Unauthenticated;
        self.credential = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated && self.credential.is_some()
    }

    /// Returns true when authenticated and logged in less than
    /// `refresh_interval` ago.
    pub fn is_fresh(&self, refresh_interval: Duration) -> bool {
        self.is_authenticated()
            && self
                .last_login_at
                .is_some_and(|at| at.elapsed() < refresh_interval)
    }
}
