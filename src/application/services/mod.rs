//! Business logic services for the application layer.

pub mod query_resolver;
pub mod session_manager;

pub use query_resolver::{QueryResolver, Resolution, ResolverSettings};
pub use session_manager::{AuthMode, LoginPolicy, SessionError, SessionManager, SessionSnapshot};
