//! Application layer services implementing the gateway logic.
//!
//! Services consume the backend and cache traits and provide a clean API for
//! HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::session_manager::SessionManager`] - Controller login and refresh
//! - [`services::query_resolver::QueryResolver`] - Path parsing, read-through cache and projection

pub mod services;
