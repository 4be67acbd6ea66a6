//! Utility helpers shared across layers.
//!
//! - [`single_flight`] - Per-key coalescing of concurrent backend fetches

pub mod single_flight;

pub use single_flight::SingleFlight;
