//! Handler for `robots.txt`.

use axum::http::header;
use axum::response::IntoResponse;

const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /\n";

/// Disallows all crawling.
///
/// # Endpoint
///
/// `GET /robots.txt`
pub async fn robots_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], ROBOTS_TXT)
}
