//! HTTP request handlers for gateway endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod robots;
pub mod sites;
pub mod topology;

pub use health::health_handler;
pub use robots::robots_handler;
pub use sites::sites_handler;
pub use topology::topology_handler;
