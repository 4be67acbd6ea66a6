//! Shapes resolver outcomes into HTTP responses.
//!
//! Projection is a pure function of the [`Resolution`], the cache backend
//! name and the pretty-print setting. Cache metadata goes into headers only;
//! it never changes the body.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tracing::error;

use crate::application::services::Resolution;

/// Always present: whether the payload came from the cache.
pub const FROM_CACHE_HEADER: &str = "x-from-cache";
/// Present on cache hits only: which cache implementation served it.
pub const CACHE_TYPE_HEADER: &str = "x-cache-type";

/// A response ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub status: StatusCode,
    pub body: Value,
    pub from_cache: bool,
    pub cache_type: Option<&'static str>,
    pub pretty: bool,
}

/// Builds the externally visible response for a resolution.
///
/// Errors carry their own status; successful payloads are `200 OK`.
pub fn project(resolution: Resolution, cache_backend: &'static str, pretty: bool) -> Projection {
    let (status, body) = match resolution.result {
        Ok(payload) => (StatusCode::OK, payload),
        Err(e) => (
            e.status(),
            serde_json::to_value(e.to_body()).unwrap_or(Value::Null),
        ),
    };

    Projection {
        status,
        body,
        from_cache: resolution.from_cache,
        cache_type: resolution.from_cache.then_some(cache_backend),
        pretty,
    }
}

impl IntoResponse for Projection {
    fn into_response(self) -> Response {
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(&self.body)
        } else {
            serde_json::to_vec(&self.body)
        };

        let bytes = match encoded {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to encode response body: {}", e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        let mut response = (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            bytes,
        )
            .into_response();

        let headers = response.headers_mut();
        headers.insert(
            FROM_CACHE_HEADER,
            HeaderValue::from_static(if self.from_cache { "true" } else { "false" }),
        );
        if let Some(cache_type) = self.cache_type {
            headers.insert(CACHE_TYPE_HEADER, HeaderValue::from_static(cache_type));
        }

        response
    }
}
