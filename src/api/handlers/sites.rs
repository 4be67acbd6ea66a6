//! Handler for the site listing.

use axum::extract::State;

use crate::api::projector::{Projection, project};
use crate::state::AppState;

/// Lists every site of the tenant.
///
/// # Endpoint
///
/// `GET /site` (and `GET /site/`)
///
/// # Response Codes
///
/// - **200 OK**: JSON array of site records
/// - **403 Forbidden**: the controller refused the session
/// - **500 Internal Server Error**: login failed, the controller failed, or
///   the listing was empty
pub async fn sites_handler(State(state): State<AppState>) -> Projection {
    let resolution = state.resolver.resolve_sites().await;

    project(
        resolution,
        state.resolver.cache().backend_name(),
        state.always_pretty,
    )
}
