//! Gateway route configuration.

use crate::api::handlers::{health_handler, robots_handler, sites_handler, topology_handler};
use crate::state::AppState;
use axum::{Router, routing::get};

/// All public gateway routes.
///
/// # Endpoints
///
/// - `GET /site`         - Site listing (`/site/` via path normalization)
/// - `GET /{*path}`      - Topology and single-link lookups
/// - `GET /robots.txt`   - Disallow-all robots file
/// - `GET /health`       - Cache and session status
///
/// Static routes take priority over the catch-all, so `/site` never reaches
/// the topology handler.
pub fn gateway_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/robots.txt", get(robots_handler))
        .route("/site", get(sites_handler))
        .route("/", get(topology_handler))
        .route("/{*path}", get(topology_handler))
}
