//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /site`            - Site listing
//! - `GET  /site/{id}[...]`  - Topology and SWI/path lookups
//! - `GET  /robots.txt`      - Static robots file
//! - `GET  /health`          - Health check: cache, session
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::middleware::tracing;
use crate::state::AppState;
use axum::Router;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let router = api::routes::gateway_routes()
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
