//! Shared application state injected into handlers.

use std::sync::Arc;

use crate::application::services::QueryResolver;

/// Per-process context built at startup and cloned into every handler.
///
/// The resolver owns the session manager and cache, so no gateway state
/// lives in globals.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<QueryResolver>,
    /// Indent JSON response bodies.
    pub always_pretty: bool,
}

impl AppState {
    pub fn new(resolver: Arc<QueryResolver>, always_pretty: bool) -> Self {
        Self {
            resolver,
            always_pretty,
        }
    }
}
