//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse, SessionCheck};
use crate::state::AppState;

/// Returns gateway health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Cache**: PING for Redis, always ok in-process
/// 2. **Session**: degraded only when the last login run gave up
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "cache": { "status": "ok", "message": "redis reachable" },
///     "session": {
///       "status": "ok",
///       "state": "authenticated",
///       "mode": "interactive",
///       "region": "hood",
///       "last_login_at": "2026-10-19T08:00:00Z"
///     }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let cache_check = check_cache(&state).await;
    let session_check = check_session(&state);

    let all_healthy = cache_check.status == "ok" && session_check.status == "ok";

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            cache: cache_check,
            session: session_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Checks cache connectivity.
async fn check_cache(state: &AppState) -> CheckStatus {
    let cache = state.resolver.cache();
    let name = cache.backend_name();

    if cache.health_check().await {
        CheckStatus {
            status: "ok".to_string(),
            message: Some(format!("{} reachable", name)),
        }
    } else {
        CheckStatus {
            status: "error".to_string(),
            message: Some(format!("{} connection failed", name)),
        }
    }
}

/// Reports the controller session without triggering a login.
fn check_session(state: &AppState) -> SessionCheck {
    let snapshot = state.resolver.session().snapshot();

    SessionCheck {
        status: if snapshot.last_login_failed { "error" } else { "ok" }.to_string(),
        state: snapshot.state.as_str().to_string(),
        mode: if snapshot.static_token {
            "static_token"
        } else {
            "interactive"
        }
        .to_string(),
        region: snapshot.region,
        last_login_at: snapshot.last_login_at,
    }
}
