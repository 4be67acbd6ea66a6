#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use topology_gateway::application::services::{
    LoginPolicy, QueryResolver, ResolverSettings, SessionManager,
};
use topology_gateway::domain::backend::{
    BackendClient, BackendFailure, BackendResult, FailureKind, LoginGrant, Profile,
    TopologyRequest,
};
use topology_gateway::domain::entities::{Credential, LoginCredentials};
use topology_gateway::infrastructure::cache::{CacheService, MemoryCache};
use topology_gateway::state::AppState;

pub const TENANT: &str = "tenant-1";

/// In-memory controller with call counters.
pub struct FakeBackend {
    pub logins: AtomicUsize,
    pub logouts: AtomicUsize,
    pub topology_calls: AtomicUsize,
    pub site_calls: AtomicUsize,
    /// Rejects the next topology query with HTTP 403.
    pub forbid_next: AtomicBool,
    pub fail_login: AtomicBool,
    topology: Mutex<Value>,
    sites: Mutex<Value>,
    delay: Mutex<Duration>,
    tokens_issued: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            logins: AtomicUsize::new(0),
            logouts: AtomicUsize::new(0),
            topology_calls: AtomicUsize::new(0),
            site_calls: AtomicUsize::new(0),
            forbid_next: AtomicBool::new(false),
            fail_login: AtomicBool::new(false),
            topology: Mutex::new(sample_topology()),
            sites: Mutex::new(json!({"items": [{"id": "S1"}, {"id": "S2"}]})),
            delay: Mutex::new(Duration::ZERO),
            tokens_issued: AtomicUsize::new(0),
        }
    }

    pub fn with_topology(self, topology: Value) -> Self {
        *self.topology.lock().unwrap() = topology;
        self
    }

    pub fn with_sites(self, sites: Value) -> Self {
        *self.sites.lock().unwrap() = sites;
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = delay;
        self
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

pub fn sample_topology() -> Value {
    json!({
        "links": [
            {"path_id": "P1", "source_node_id": "A", "target_node_id": "B"},
            {"path_id": "P2", "source_node_id": "A", "target_node_id": "C"}
        ]
    })
}

#[async_trait]
impl BackendClient for FakeBackend {
    async fn login(&self, _credentials: &LoginCredentials) -> BackendResult<LoginGrant> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if self.fail_login.load(Ordering::SeqCst) {
            return Err(BackendFailure::new(
                FailureKind::Unauthorized,
                json!({"error": "invalid credentials"}),
            ));
        }
        let n = self.tokens_issued.fetch_add(1, Ordering::SeqCst);
        Ok(LoginGrant {
            token: format!("token-{}", n),
            tenant_id: None,
            region: None,
        })
    }

    async fn refresh_region(&self, _region: &str) -> BackendResult<()> {
        Ok(())
    }

    async fn get_profile(&self, _token: &str) -> BackendResult<Profile> {
        Ok(Profile {
            tenant_id: TENANT.to_string(),
            email: None,
        })
    }

    async fn query_topology(
        &self,
        _credential: &Credential,
        _request: &TopologyRequest,
    ) -> BackendResult<Value> {
        self.topology_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.forbid_next.swap(false, Ordering::SeqCst) {
            return Err(BackendFailure::new(
                FailureKind::Forbidden,
                json!({"_error": [{"code": "FORBIDDEN"}]}),
            ));
        }
        Ok(self.topology.lock().unwrap().clone())
    }

    async fn list_sites(&self, _credential: &Credential) -> BackendResult<Value> {
        self.site_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        Ok(self.sites.lock().unwrap().clone())
    }

    async fn logout(&self, _token: &str) -> BackendResult<()> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Cache wrapper that counts writes.
pub struct CountingCache {
    inner: MemoryCache,
    pub sets: AtomicUsize,
}

impl CountingCache {
    pub fn new() -> Self {
        Self {
            inner: MemoryCache::new(Duration::from_secs(300)),
            sets: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CacheService for CountingCache {
    async fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &Value, ttl: Option<Duration>) {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    async fn health_check(&self) -> bool {
        true
    }
}

pub fn test_policy() -> LoginPolicy {
    LoginPolicy {
        refresh_interval: Duration::from_secs(3600),
        max_attempts: 2,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(2),
        timeout: Duration::from_secs(5),
    }
}

pub fn test_settings() -> ResolverSettings {
    ResolverSettings {
        cache_ttl: Duration::from_secs(300),
        backend_timeout: Duration::from_secs(5),
    }
}

/// Builds state around an interactive session.
pub fn create_test_state(
    backend: Arc<FakeBackend>,
    cache: Arc<CountingCache>,
    settings: ResolverSettings,
) -> AppState {
    let session = Arc::new(SessionManager::interactive(
        backend.clone(),
        LoginCredentials {
            email: "ops@example.com".to_string(),
            password: "secret".to_string(),
        },
        test_policy(),
    ));

    let resolver = Arc::new(QueryResolver::new(session, cache, backend, settings));
    AppState::new(resolver, false)
}
