//! HTTPS client for the controller REST API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::backend::{
    BackendClient, BackendFailure, BackendResult, FailureKind, LoginGrant, Profile,
    TopologyRequest,
};
use crate::domain::entities::{Credential, LoginCredentials};

/// Header carrying the session token on every authenticated call.
const AUTH_HEADER: &str = "X-Auth-Token";
/// Header the controller uses to point a client at its home region.
const REGION_HEADER: &str = "x-redirect-region";

const LOGIN_PATH: &str = "/v2.0/api/login";
const LOGOUT_PATH: &str = "/v2.0/api/logout";
const PROFILE_PATH: &str = "/v2.0/api/profile";
const TOPOLOGY_VERSION: &str = "v3.0";
const SITES_VERSION: &str = "v4.7";

const APP_NAME: &str = "Topology Gateway";

/// Outgoing `User-Agent`, tagged with the gateway name and version so the
/// controller operators can trace requests back to it.
fn user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!(
        "{}/{} ({} v{})",
        env!("CARGO_PKG_NAME"),
        version,
        APP_NAME,
        version
    )
}

/// [`BackendClient`] speaking to the controller over HTTPS.
///
/// The controller base URL starts at the configured global endpoint and is
/// rewritten to the tenant's regional endpoint by
/// [`BackendClient::refresh_region`].
pub struct ControllerClient {
    http: reqwest::Client,
    base_url: RwLock<Url>,
}

impl ControllerClient {
    /// Builds a client for `base_url` with a per-request `timeout`.
    ///
    /// With `ssl_verify` off, invalid controller certificates are accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or the HTTP client cannot
    /// be constructed.
    pub fn new(base_url: &str, timeout: Duration, ssl_verify: bool) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid controller URL '{}'", base_url))?;

        if !ssl_verify {
            warn!("TLS certificate verification for the controller is disabled");
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent())
            .danger_accept_invalid_certs(!ssl_verify)
            .build()
            .context("Failed to build controller HTTP client")?;

        Ok(Self {
            http,
            base_url: RwLock::new(base_url),
        })
    }

    /// Current controller base URL.
    pub fn base_url(&self) -> Url {
        self.base_url
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn request(&self, method: Method, path: &str) -> BackendResult<RequestBuilder> {
        let url = self.base_url().join(path).map_err(|e| {
            BackendFailure::new(
                FailureKind::Transport,
                Value::String(format!("invalid endpoint {}: {}", path, e)),
            )
        })?;

        Ok(self.http.request(method, url))
    }

    /// Sends a request and decodes the JSON response body.
    ///
    /// Non-success statuses become a [`BackendFailure`] carrying the body.
    async fn send(&self, request: RequestBuilder) -> BackendResult<(HeaderMap, Value)> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let headers = response.headers().clone();

        let text = response.text().await.map_err(map_transport_error)?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        if status.is_success() {
            Ok((headers, body))
        } else {
            debug!("Controller responded {}: {}", status, body);
            Err(BackendFailure::new(classify_status(status), body))
        }
    }
}

fn map_transport_error(e: reqwest::Error) -> BackendFailure {
    if e.is_timeout() {
        BackendFailure::new(FailureKind::Timeout, Value::String(e.to_string()))
    } else {
        BackendFailure::new(FailureKind::Transport, Value::String(e.to_string()))
    }
}

fn classify_status(status: StatusCode) -> FailureKind {
    match status {
        StatusCode::FORBIDDEN => FailureKind::Forbidden,
        StatusCode::UNAUTHORIZED => FailureKind::Unauthorized,
        other => FailureKind::Status(other.as_u16()),
    }
}

/// Rewrites `api.<region>.<domain>` hosts to the given region.
///
/// Hosts that do not follow that layout are returned unchanged.
fn regional_url(base: &Url, region: &str) -> Url {
    let Some(host) = base.host_str() else {
        return base.clone();
    };

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 3 || labels[0] != "api" {
        return base.clone();
    }

    let regional_host = format!("api.{}.{}", region, labels[2..].join("."));
    let mut url = base.clone();
    if url.set_host(Some(&regional_host)).is_err() {
        return base.clone();
    }
    url
}

fn string_field(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl BackendClient for ControllerClient {
    async fn login(&self, credentials: &LoginCredentials) -> BackendResult<LoginGrant> {
        let request = self.request(Method::POST, LOGIN_PATH)?.json(&json!({
            "email": credentials.email,
            "password": credentials.password,
        }));

        let (headers, body) = self.send(request).await?;

        let token = string_field(&body, "x_auth_token")
            .or_else(|| {
                headers
                    .get(AUTH_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            })
            .ok_or_else(|| {
                BackendFailure::new(
                    FailureKind::Decode,
                    json!({ "error": "login response carried no token" }),
                )
            })?;

        let region = headers
            .get(REGION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| string_field(&body, "region"));

        Ok(LoginGrant {
            token,
            tenant_id: string_field(&body, "tenant_id"),
            region,
        })
    }

    async fn refresh_region(&self, region: &str) -> BackendResult<()> {
        let mut base = self
            .base_url
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let regional = regional_url(&base, region);
        if regional != *base {
            info!("Controller endpoint moved to {}", regional);
            *base = regional;
        }

        Ok(())
    }

    async fn get_profile(&self, token: &str) -> BackendResult<Profile> {
        let request = self
            .request(Method::GET, PROFILE_PATH)?
            .header(AUTH_HEADER, token);

        let (_, body) = self.send(request).await?;

        serde_json::from_value(body.clone())
            .map_err(|_| BackendFailure::new(FailureKind::Decode, body))
    }

    async fn query_topology(
        &self,
        credential: &Credential,
        request: &TopologyRequest,
    ) -> BackendResult<Value> {
        let path = format!(
            "/{}/api/tenants/{}/topology",
            TOPOLOGY_VERSION, credential.tenant_id
        );
        let request = self
            .request(Method::POST, &path)?
            .header(AUTH_HEADER, &credential.token)
            .json(request);

        self.send(request).await.map(|(_, body)| body)
    }

    async fn list_sites(&self, credential: &Credential) -> BackendResult<Value> {
        let path = format!("/{}/api/tenants/{}/sites", SITES_VERSION, credential.tenant_id);
        let request = self
            .request(Method::GET, &path)?
            .header(AUTH_HEADER, &credential.token);

        self.send(request).await.map(|(_, body)| body)
    }

    async fn logout(&self, token: &str) -> BackendResult<()> {
        let request = self
            .request(Method::GET, LOGOUT_PATH)?
            .header(AUTH_HEADER, token);

        self.send(request).await.map(|_| ())
    }
}
