//! HTTP server initialization and runtime setup.
//!
//! Handles controller client, cache and session setup, and the Axum server lifecycle.

use crate::application::services::{QueryResolver, SessionManager};
use crate::config::Config;
use crate::domain::backend::BackendClient;
use crate::infrastructure::backend::ControllerClient;
use crate::infrastructure::cache::{CacheService, MemoryCache, RedisCache};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Controller HTTP client
/// - Redis cache (or in-process fallback)
/// - Controller session (static token or interactive login)
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - The controller URL is invalid
/// - A static token cannot be resolved to a tenant
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let backend: Arc<dyn BackendClient> = Arc::new(ControllerClient::new(
        &config.controller_url,
        config.backend_timeout(),
        config.ssl_verify,
    )?);

    let cache = build_cache(&config).await;
    let session = Arc::new(build_session(&config, backend.clone()).await?);

    let resolver = Arc::new(QueryResolver::new(
        session,
        cache,
        backend,
        config.resolver_settings(),
    ));

    let state = AppState::new(resolver, config.always_pretty);

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn build_cache(config: &Config) -> Arc<dyn CacheService> {
    if config.is_cache_distributed() {
        match RedisCache::connect_all(&config.redis_urls, config.cache_ttl()).await {
            Ok(redis) => {
                tracing::info!("Cache enabled (Redis)");
                return Arc::new(redis);
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using in-process cache.", e);
            }
        }
    } else {
        tracing::info!("Cache enabled (in-process)");
    }

    Arc::new(MemoryCache::new(config.cache_ttl()))
}

async fn build_session(config: &Config, backend: Arc<dyn BackendClient>) -> Result<SessionManager> {
    if let Some(token) = &config.auth_token {
        return SessionManager::from_static_token(backend, token.clone())
            .await
            .context("Failed to resolve tenant for CGX_AUTH_TOKEN");
    }

    let credentials = config
        .login_credentials()
        .context("CGX_USERNAME/CGX_PASSWORD must be set")?;

    tracing::info!("Interactive login enabled for {}", credentials.email);
    Ok(SessionManager::interactive(
        backend,
        credentials,
        config.login_policy(),
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
