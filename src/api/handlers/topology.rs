//! Handler for site topology and single-link lookups.

use axum::extract::State;
use axum::http::Uri;

use crate::api::projector::{Projection, project};
use crate::state::AppState;

/// Resolves a topology path.
///
/// # Endpoint
///
/// `GET /{*path}`
///
/// # Accepted Paths
///
/// - `/site/{site_id}` - every link of the site
/// - `/site/{site_id}/swi/{path_id}` or `/site/{site_id}/path/{path_id}` - one link
///
/// Any other path answers `404 {"error": "URL Not Found", "return_code": 404}`
/// without contacting the controller.
///
/// # Headers
///
/// - `X-From-Cache` - `true` when served from cache, else `false`
/// - `X-Cache-Type` - cache backend name, on cache hits only
pub async fn topology_handler(State(state): State<AppState>, uri: Uri) -> Projection {
    let resolution = state.resolver.resolve_path(uri.path()).await;

    project(
        resolution,
        state.resolver.cache().backend_name(),
        state.always_pretty,
    )
}
