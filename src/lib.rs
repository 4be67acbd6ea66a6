//! # Topology Gateway
//!
//! A read-through caching HTTP gateway in front of the CloudGenix controller
//! topology API, built with Axum and Redis.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Queries, sessions, topology documents and the backend trait
//! - **Application Layer** ([`application`]) - Session management and query resolution
//! - **Infrastructure Layer** ([`infrastructure`]) - Controller client and cache backends
//! - **API Layer** ([`api`]) - Handlers, response projection and middleware
//!
//! ## Endpoints
//!
//! - `GET /site/{site_id}` - Full topology of a site
//! - `GET /site/{site_id}/swi/{path_id}` - One link of a site (also `/path/`)
//! - `GET /site` - All sites of the tenant
//! - `GET /robots.txt` - Crawler exclusion
//! - `GET /health` - Cache and session health
//!
//! Every JSON response carries `X-From-Cache`; cache hits also carry `X-Cache-Type`.
//!
//! ## Quick Start
//!
//! ```bash
//! export CGX_AUTH_TOKEN="..."
//! export REDIS_URL="redis://localhost:6379"  # Optional
//!
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;

pub use error::QueryError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{
        LoginPolicy, QueryResolver, ResolverSettings, SessionManager,
    };
    pub use crate::domain::backend::{
        BackendClient, BackendFailure, BackendResult, FailureKind, LoginGrant, Profile,
        TopologyRequest,
    };
    pub use crate::domain::entities::{Credential, LoginCredentials, Query};
    pub use crate::error::QueryError;
    pub use crate::infrastructure::cache::{CacheService, MemoryCache};
    pub use crate::routes::app_router;
    pub use crate::state::AppState;
}
