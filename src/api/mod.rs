//! HTTP API layer for request/response handling.
//!
//! This layer translates HTTP requests into resolver calls and formats
//! responses according to the gateway contract.
//!
//! # Modules
//!
//! - [`dto`] - Data Transfer Objects for typed responses
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Request tracing
//! - [`projector`] - Resolution to response projection
//! - [`routes`] - Route configuration

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod projector;
pub mod routes;
