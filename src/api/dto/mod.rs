//! Data Transfer Objects for gateway responses.
//!
//! Topology payloads are passed through as raw JSON; only the health
//! endpoint has a typed response.

pub mod health;
