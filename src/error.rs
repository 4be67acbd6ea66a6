//! Outcome taxonomy for query resolution.
//!
//! Every path through the resolver ends either in a projected payload or in
//! one of the [`QueryError`] kinds below. The HTTP status and error body are
//! derived from the kind by [`crate::api::projector`].

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::backend::BackendFailure;

pub const MSG_URL_NOT_FOUND: &str = "URL Not Found";
pub const MSG_NO_LINKS: &str = "No links found";
pub const MSG_TARGET_NOT_FOUND: &str = "Requested SWI/PATH not found";
pub const MSG_LOGIN_FAILED: &str = "Login or profile retrieval failed";
pub const MSG_NO_SITES: &str = "Empty sites list or API call failed";
pub const MSG_FORBIDDEN: &str = "API call failed (forbidden)";
pub const MSG_BACKEND: &str = "API call failed";

/// Typed failure of a gateway query.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// Malformed path, empty result set or unmatched target.
    #[error("{message}")]
    NotFound { message: String },
    /// The controller rejected the session credential.
    #[error("{message}")]
    Forbidden { message: String, details: Value },
    /// Any other controller failure, including timeouts.
    #[error("{message}")]
    Backend { message: String, details: Value },
    /// Login/session failure or an unusable site listing.
    #[error("{message}")]
    Internal {
        message: String,
        details: Option<Value>,
    },
}

impl QueryError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn forbidden(details: Value) -> Self {
        Self::Forbidden {
            message: MSG_FORBIDDEN.to_string(),
            details,
        }
    }

    pub fn backend(details: Value) -> Self {
        Self::Backend {
            message: MSG_BACKEND.to_string(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            details: None,
        }
    }

    /// Internal error that keeps the controller payload it was derived from.
    pub fn internal_with_payload(message: impl Into<String>, payload: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details: Some(payload),
        }
    }

    /// Classifies a failed backend call.
    ///
    /// Callers are responsible for invalidating the session when the result
    /// is [`QueryError::Forbidden`].
    pub fn from_backend(failure: BackendFailure) -> Self {
        if failure.is_forbidden() {
            Self::forbidden(failure.payload)
        } else {
            Self::backend(failure.payload)
        }
    }

    /// Machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Forbidden { .. } => "forbidden",
            Self::Backend { .. } => "backend_error",
            Self::Internal { .. } => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Backend { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NotFound { message }
            | Self::Forbidden { message, .. }
            | Self::Backend { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::NotFound { .. } => None,
            Self::Forbidden { details, .. } | Self::Backend { details, .. } => Some(details),
            Self::Internal { details, .. } => details.as_ref(),
        }
    }

    /// Error body as returned to callers.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.message().to_string(),
            return_code: self.status().as_u16(),
            details: self.details().cloned(),
        }
    }
}

/// Wire shape of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub return_code: u16,
    /// Raw controller payload, when one is available.
    #[serde(rename = "data", skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}
