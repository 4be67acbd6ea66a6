//! Core domain entities representing the gateway data model.
//!
//! Entities are plain data structures with small helpers; orchestration lives
//! in [`crate::application::services`].
//!
//! # Entity Types
//!
//! - [`Query`] - A typed lookup parsed from a request path
//! - [`Session`] - Backend session state and its [`Credential`]
//! - [`TopologyDocument`] / [`SitesPayload`] - Controller payload views

pub mod query;
pub mod session;
pub mod topology;

pub use query::{ALL_SITES_KEY, Query};
pub use session::{Credential, LoginCredentials, Session, SessionState, StaticTokenClaims};
pub use topology::{LinkRecord, SitesPayload, TopologyDocument};
