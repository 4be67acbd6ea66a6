//! Read-through resolution of topology queries.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::application::services::SessionManager;
use crate::domain::backend::{BackendClient, BackendFailure, TopologyRequest};
use crate::domain::entities::{Credential, Query, SitesPayload, TopologyDocument};
use crate::error::{
    MSG_LOGIN_FAILED, MSG_NO_LINKS, MSG_NO_SITES, MSG_TARGET_NOT_FOUND, MSG_URL_NOT_FOUND,
    QueryError,
};
use crate::infrastructure::cache::CacheService;
use crate::utils::SingleFlight;

/// Result of resolving one query.
///
/// `from_cache` is reported for errors too, so callers can always emit it.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub result: Result<Value, QueryError>,
    pub from_cache: bool,
}

impl Resolution {
    fn fresh_error(error: QueryError) -> Self {
        Self {
            result: Err(error),
            from_cache: false,
        }
    }
}

/// Payload loaded for a cache key, shared between coalesced callers.
#[derive(Debug, Clone)]
struct Loaded {
    payload: Value,
    from_cache: bool,
}

/// Timing settings for the resolver.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Lifetime of cached topology and site payloads.
    pub cache_ttl: Duration,
    /// Deadline for a single backend call.
    pub backend_timeout: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            backend_timeout: Duration::from_secs(30),
        }
    }
}

/// Turns request paths into projected controller data.
///
/// # Request Flow
///
/// 1. Parse the path into a [`Query`] (malformed paths stop here)
/// 2. Ensure the backend session is authenticated
/// 3. Read the cache; on a miss, fetch from the controller
/// 4. Classify backend failures, invalidating the session when forbidden
/// 5. Write fresh payloads through to the cache
/// 6. Project the requested subset
///
/// Concurrent misses for the same key share one backend fetch.
pub struct QueryResolver {
    session: Arc<SessionManager>,
    cache: Arc<dyn CacheService>,
    backend: Arc<dyn BackendClient>,
    settings: ResolverSettings,
    in_flight: SingleFlight<Result<Loaded, BackendFailure>>,
}

impl QueryResolver {
    pub fn new(
        session: Arc<SessionManager>,
        cache: Arc<dyn CacheService>,
        backend: Arc<dyn BackendClient>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            session,
            cache,
            backend,
            settings,
            in_flight: SingleFlight::new(),
        }
    }

    pub fn cache(&self) -> &Arc<dyn CacheService> {
        &self.cache
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Resolves a `site/...` request path.
    ///
    /// Paths outside the two accepted shapes yield [`QueryError::NotFound`]
    /// without touching the session, cache or backend.
    pub async fn resolve_path(&self, path: &str) -> Resolution {
        match Query::parse(path) {
            Some(query) => self.resolve(&query).await,
            None => {
                debug!("Rejected path: {}", path);
                Resolution::fresh_error(QueryError::not_found(MSG_URL_NOT_FOUND))
            }
        }
    }

    /// Resolves the full site listing.
    pub async fn resolve_sites(&self) -> Resolution {
        self.resolve(&Query::SitesList).await
    }

    /// Resolves an already parsed query.
    pub async fn resolve(&self, query: &Query) -> Resolution {
        let credential = match self.session.ensure_authenticated().await {
            Ok(credential) => credential,
            Err(e) => {
                warn!("Cannot resolve {:?}: {}", query, e);
                return Resolution::fresh_error(QueryError::internal(MSG_LOGIN_FAILED));
            }
        };

        let loaded = match self.load(query, &credential).await {
            Ok(loaded) => loaded,
            Err(e) => return Resolution::fresh_error(e),
        };

        Resolution {
            result: project(query, &loaded.payload),
            from_cache: loaded.from_cache,
        }
    }

    /// Reads the payload for `query` from the cache or the controller.
    async fn load(&self, query: &Query, credential: &Credential) -> Result<Loaded, QueryError> {
        let key = query.cache_key();

        if let Some(payload) = self.cache.get(key).await {
            return Ok(Loaded {
                payload,
                from_cache: true,
            });
        }

        let loaded = self
            .in_flight
            .run(key, || self.fetch_and_store(query, credential))
            .await;

        match loaded {
            Ok(loaded) => Ok(loaded),
            Err(failure) => {
                let error = QueryError::from_backend(failure);
                if matches!(error, QueryError::Forbidden { .. }) {
                    self.session.invalidate(credential).await;
                }
                Err(error)
            }
        }
    }

    /// Fetches `query` from the controller and caches a successful payload.
    ///
    /// Runs once per key at a time; the cache is read again first because a
    /// previous flight may have completed since the caller's own lookup.
    async fn fetch_and_store(
        &self,
        query: &Query,
        credential: &Credential,
    ) -> Result<Loaded, BackendFailure> {
        let key = query.cache_key();

        if let Some(payload) = self.cache.get(key).await {
            return Ok(Loaded {
                payload,
                from_cache: true,
            });
        }

        let operation = match query {
            Query::SitesList => "list_sites",
            Query::SiteTopology { .. } | Query::SitePath { .. } => "query_topology",
        };

        let call = async {
            match query {
                Query::SitesList => self.backend.list_sites(credential).await,
                Query::SiteTopology { site_id } | Query::SitePath { site_id, .. } => {
                    self.backend
                        .query_topology(credential, &TopologyRequest::basenet(site_id))
                        .await
                }
            }
        };

        let payload = tokio::time::timeout(self.settings.backend_timeout, call)
            .await
            .map_err(|_| BackendFailure::timeout(operation))??;

        self.cache
            .set(key, &payload, Some(self.settings.cache_ttl))
            .await;

        Ok(Loaded {
            payload,
            from_cache: false,
        })
    }
}

/// Selects the part of a controller payload that `query` asks for.
fn project(query: &Query, payload: &Value) -> Result<Value, QueryError> {
    match query {
        Query::SiteTopology { .. } => {
            let document = TopologyDocument::from_payload(payload);
            if document.links.is_empty() {
                Err(QueryError::not_found(MSG_NO_LINKS))
            } else {
                Ok(Value::Array(document.links))
            }
        }
        Query::SitePath { path_id, .. } => TopologyDocument::from_payload(payload)
            .find_link(path_id)
            .cloned()
            .ok_or_else(|| QueryError::not_found(MSG_TARGET_NOT_FOUND)),
        Query::SitesList => {
            let sites = SitesPayload::from_payload(payload);
            if sites.items.is_empty() {
                Err(QueryError::internal_with_payload(
                    MSG_NO_SITES,
                    payload.clone(),
                ))
            } else {
                Ok(Value::Array(sites.items))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::LoginPolicy;
    use crate::domain::backend::{FailureKind, LoginGrant, MockBackendClient, Profile};
    use crate::domain::entities::LoginCredentials;
    use crate::infrastructure::cache::{MemoryCache, MockCacheService};
    use serde_json::json;

    fn credential() -> Credential {
        Credential {
            token: "static".to_string(),
            tenant_id: "tenant-1".to_string(),
        }
    }

    fn document() -> Value {
        json!({
            "links": [
                {"path_id": "P1", "type": "internet-stub"},
                {"path_id": "P2", "type": "vpn"},
                {"path_id": "P2", "type": "duplicate"}
            ]
        })
    }

    fn resolver_with(backend: MockBackendClient, cache: Arc<dyn CacheService>) -> QueryResolver {
        let backend: Arc<dyn BackendClient> = Arc::new(backend);
        let session = Arc::new(SessionManager::static_token(backend.clone(), credential(), None));
        QueryResolver::new(session, cache, backend, ResolverSettings::default())
    }

    fn memory_cache() -> Arc<dyn CacheService> {
        Arc::new(MemoryCache::new(Duration::from_secs(300)))
    }

    #[tokio::test]
    async fn test_malformed_paths_touch_nothing() {
        // Mocks without expectations panic on any call.
        let resolver = resolver_with(MockBackendClient::new(), Arc::new(MockCacheService::new()));

        for path in ["foo", "/site", "/site/S/bar/T", "/bogus", "/site/S/swi/T/x"] {
            let resolution = resolver.resolve_path(path).await;
            let error = resolution.result.unwrap_err();

            assert_eq!(error.message(), MSG_URL_NOT_FOUND);
            assert_eq!(error.status().as_u16(), 404);
            assert!(!resolution.from_cache);
        }
    }

    #[tokio::test]
    async fn test_site_topology_miss_then_hit() {
        let mut backend = MockBackendClient::new();
        backend
            .expect_query_topology()
            .withf(|cred, request| {
                cred.tenant_id == "tenant-1"
                    && request.kind == "basenet"
                    && request.nodes == vec!["SITE123".to_string()]
            })
            .times(1)
            .returning(|_, _| Ok(document()));

        let resolver = resolver_with(backend, memory_cache());

        let first = resolver.resolve_path("/site/SITE123").await;
        assert!(!first.from_cache);
        let first_body = first.result.unwrap();
        assert_eq!(first_body.as_array().unwrap().len(), 3);

        let second = resolver.resolve_path("/site/SITE123").await;
        assert!(second.from_cache);
        assert_eq!(second.result.unwrap(), first_body);
    }

    #[tokio::test]
    async fn test_site_path_selects_first_match() {
        let mut backend = MockBackendClient::new();
        backend
            .expect_query_topology()
            .times(1)
            .returning(|_, _| Ok(document()));

        let resolver = resolver_with(backend, memory_cache());

        let record = resolver.resolve_path("/site/SITE123/swi/P2").await.result.unwrap();
        assert_eq!(record, json!({"path_id": "P2", "type": "vpn"}));

        let record = resolver.resolve_path("/site/SITE123/path/P1").await.result.unwrap();
        assert_eq!(record["type"], "internet-stub");

        let error = resolver
            .resolve_path("/site/SITE123/swi/P9")
            .await
            .result
            .unwrap_err();
        assert_eq!(error.message(), MSG_TARGET_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_links_is_not_found_but_cached() {
        let mut backend = MockBackendClient::new();
        backend
            .expect_query_topology()
            .times(1)
            .returning(|_, _| Ok(json!({"links": []})));

        let mut cache = MockCacheService::new();
        cache.expect_get().returning(|_| None);
        cache
            .expect_set()
            .withf(|key, _, ttl| key == "EMPTY" && *ttl == Some(Duration::from_secs(300)))
            .times(1)
            .returning(|_, _, _| ());

        let resolver = resolver_with(backend, Arc::new(cache));

        let error = resolver.resolve_path("/site/EMPTY").await.result.unwrap_err();
        assert_eq!(error.message(), MSG_NO_LINKS);
        assert_eq!(error.status().as_u16(), 404);
    }

    #[tokio::test]
    async fn test_backend_error_is_not_cached() {
        let mut backend = MockBackendClient::new();
        backend.expect_query_topology().times(1).returning(|_, _| {
            Err(BackendFailure::new(
                FailureKind::Status(502),
                json!({"message": "bad gateway"}),
            ))
        });

        let mut cache = MockCacheService::new();
        cache.expect_get().returning(|_| None);
        cache.expect_set().times(0);

        let resolver = resolver_with(backend, Arc::new(cache));

        let error = resolver.resolve_path("/site/S1").await.result.unwrap_err();
        assert_eq!(error.kind(), "backend_error");
        assert_eq!(error.status().as_u16(), 500);
        assert_eq!(error.details(), Some(&json!({"message": "bad gateway"})));
    }

    #[tokio::test]
    async fn test_forbidden_substring_is_classified() {
        let mut backend = MockBackendClient::new();
        backend.expect_query_topology().times(1).returning(|_, _| {
            Err(BackendFailure::new(
                FailureKind::Status(400),
                json!("Request FORBIDDEN for tenant"),
            ))
        });

        let resolver = resolver_with(backend, memory_cache());

        let error = resolver.resolve_path("/site/S1").await.result.unwrap_err();
        assert_eq!(error.status().as_u16(), 403);
        assert_eq!(error.details(), Some(&json!("Request FORBIDDEN for tenant")));
    }

    #[tokio::test]
    async fn test_forbidden_forces_fresh_login() {
        let mut backend = MockBackendClient::new();
        backend.expect_login().times(2).returning(|_| {
            Ok(LoginGrant {
                token: "token".to_string(),
                tenant_id: None,
                region: None,
            })
        });
        backend.expect_get_profile().times(2).returning(|_| {
            Ok(Profile {
                tenant_id: "tenant-1".to_string(),
                email: None,
            })
        });

        let mut seq = mockall::Sequence::new();
        backend
            .expect_query_topology()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(BackendFailure::new(FailureKind::Forbidden, json!({}))));
        backend
            .expect_query_topology()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(document()));

        let backend: Arc<dyn BackendClient> = Arc::new(backend);
        let session = Arc::new(SessionManager::interactive(
            backend.clone(),
            LoginCredentials {
                email: "ops@example.com".to_string(),
                password: "secret".to_string(),
            },
            LoginPolicy::default(),
        ));
        let resolver = QueryResolver::new(
            session,
            memory_cache(),
            backend,
            ResolverSettings::default(),
        );

        let first = resolver.resolve_path("/site/S1").await;
        assert_eq!(first.result.unwrap_err().kind(), "forbidden");

        let second = resolver.resolve_path("/site/S1").await;
        assert!(second.result.is_ok());
        assert!(!second.from_cache);
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_failure_is_internal_error() {
        let mut backend = MockBackendClient::new();
        backend
            .expect_login()
            .returning(|_| Err(BackendFailure::new(FailureKind::Unauthorized, json!("bad"))));
        backend.expect_query_topology().times(0);

        let backend: Arc<dyn BackendClient> = Arc::new(backend);
        let session = Arc::new(SessionManager::interactive(
            backend.clone(),
            LoginCredentials {
                email: "ops@example.com".to_string(),
                password: "wrong".to_string(),
            },
            LoginPolicy {
                max_attempts: 2,
                ..LoginPolicy::default()
            },
        ));
        let resolver = QueryResolver::new(
            session,
            Arc::new(MockCacheService::new()),
            backend,
            ResolverSettings::default(),
        );

        let error = resolver.resolve_path("/site/S1").await.result.unwrap_err();
        assert_eq!(error.message(), MSG_LOGIN_FAILED);
        assert_eq!(error.status().as_u16(), 500);
    }

    #[tokio::test]
    async fn test_sites_list() {
        let mut backend = MockBackendClient::new();
        backend
            .expect_list_sites()
            .times(1)
            .returning(|_| Ok(json!({"items": [{"id": "1", "name": "Branch"}]})));

        let cache = memory_cache();
        let resolver = resolver_with(backend, cache.clone());

        let sites = resolver.resolve_sites().await.result.unwrap();
        assert_eq!(sites, json!([{"id": "1", "name": "Branch"}]));
        assert!(cache.get("allsites").await.is_some());

        assert!(resolver.resolve_sites().await.from_cache);
    }

    #[tokio::test]
    async fn test_empty_sites_list_is_internal_error() {
        let mut backend = MockBackendClient::new();
        backend
            .expect_list_sites()
            .times(1)
            .returning(|_| Ok(json!({"items": [], "total_count": 0})));

        let resolver = resolver_with(backend, memory_cache());

        let error = resolver.resolve_sites().await.result.unwrap_err();
        assert_eq!(error.message(), MSG_NO_SITES);
        assert_eq!(error.status().as_u16(), 500);
        assert_eq!(
            error.details(),
            Some(&json!({"items": [], "total_count": 0}))
        );
    }
}
