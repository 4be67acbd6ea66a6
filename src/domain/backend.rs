//! Contract for the controller API consumed by the gateway.
//!
//! The gateway never talks to the controller directly; it goes through a
//! [`BackendClient`] so that session handling and query resolution can be
//! tested against mocks.
//!
//! # Implementations
//!
//! - [`crate::infrastructure::backend::ControllerClient`] - HTTPS client (reqwest)
//! - Test mocks available with `cfg(test)`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::entities::{Credential, LoginCredentials};

/// Classification of a failed backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// HTTP 403 or equivalent.
    Forbidden,
    /// HTTP 401 or equivalent.
    Unauthorized,
    /// The call did not complete within its deadline.
    Timeout,
    /// Connection or protocol failure before a response was received.
    Transport,
    /// Any other non-success status.
    Status(u16),
    /// The response could not be decoded.
    Decode,
}

/// A failed backend call with its raw payload kept for diagnostics.
#[derive(Debug, Clone, Error)]
#[error("backend call failed ({kind:?}): {payload}")]
pub struct BackendFailure {
    pub kind: FailureKind,
    pub payload: Value,
}

impl BackendFailure {
    pub fn new(kind: FailureKind, payload: Value) -> Self {
        Self { kind, payload }
    }

    pub fn timeout(operation: &str) -> Self {
        Self::new(
            FailureKind::Timeout,
            Value::String(format!("{operation} timed out")),
        )
    }

    /// Returns true when the backend refused the credential.
    ///
    /// Uses the structured kind first and falls back to a case-insensitive
    /// search for `forbidden` in the payload when the kind is not specific.
    pub fn is_forbidden(&self) -> bool {
        match self.kind {
            FailureKind::Forbidden => true,
            FailureKind::Status(_) | FailureKind::Decode | FailureKind::Transport => {
                payload_mentions_forbidden(&self.payload)
            }
            FailureKind::Unauthorized | FailureKind::Timeout => false,
        }
    }
}

fn payload_mentions_forbidden(payload: &Value) -> bool {
    let text = match payload {
        Value::String(s) => s.to_ascii_lowercase(),
        other => other.to_string().to_ascii_lowercase(),
    };
    text.contains("forbidden")
}

/// Result type for backend calls.
pub type BackendResult<T> = Result<T, BackendFailure>;

/// Credential returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGrant {
    pub token: String,
    pub tenant_id: Option<String>,
    pub region: Option<String>,
}

/// Operator profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub tenant_id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of a topology query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub nodes: Vec<String>,
}

impl TopologyRequest {
    /// A `basenet` query for a single site.
    pub fn basenet(site_id: &str) -> Self {
        Self {
            kind: "basenet".to_string(),
            nodes: vec![site_id.to_string()],
        }
    }
}

/// Remote procedure interface of the controller API.
///
/// Every call reports success or a [`BackendFailure`] carrying the raw payload.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Exchanges login credentials for a session token.
    async fn login(&self, credentials: &LoginCredentials) -> BackendResult<LoginGrant>;

    /// Points subsequent calls at the controller serving `region`.
    async fn refresh_region(&self, region: &str) -> BackendResult<()>;

    /// Looks up the profile (tenant) that owns `token`.
    async fn get_profile(&self, token: &str) -> BackendResult<Profile>;

    /// Runs a topology query and returns the raw document.
    async fn query_topology(
        &self,
        credential: &Credential,
        request: &TopologyRequest,
    ) -> BackendResult<Value>;

    /// Lists every site of the tenant and returns the raw payload.
    async fn list_sites(&self, credential: &Credential) -> BackendResult<Value>;

    /// Ends the session bound to `token`.
    async fn logout(&self, token: &str) -> BackendResult<()>;
}
