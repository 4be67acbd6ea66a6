//! Domain layer containing gateway entities and the backend contract.
//!
//! # Architecture
//!
//! - [`entities`] - Queries, sessions and topology payloads
//! - [`backend`] - The [`backend::BackendClient`] trait implemented by the
//!   infrastructure layer
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - The backend trait defines the contract implemented by infrastructure
//! - Business logic is encapsulated in services (see [`crate::application::services`])

pub mod backend;
pub mod entities;
