//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain and application
//! layers, providing concrete implementations for caching and the controller
//! API.
//!
//! # Modules
//!
//! - [`backend`] - reqwest client for the controller REST API
//! - [`cache`] - Caching abstractions (in-process and Redis implementations)

pub mod backend;
pub mod cache;
