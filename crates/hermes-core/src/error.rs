//! Error types for Hermes.
//!
//! [`HermesError`] is the error every stage of the dispatcher reports, and the
//! error handlers return. Each variant belongs to an [`ErrorCategory`] that
//! fixes its HTTP status code, so the transport layer never has to inspect
//! messages to pick a status.
//!
//! | Category | Status | Raised by |
//! |---|---|---|
//! | `Registration` | 500 | endpoint compilation at startup |
//! | `NotFound` | 404 | route matching |
//! | `BadRequest` | 400 | query parsing, content negotiation, argument binding |
//! | `Unauthorized` | 401 | security resolution |
//! | `Internal` | 500 | marshalling, handler panics |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`HermesError`].
pub type HermesResult<T> = Result<T, HermesError>;

/// Categories of errors for classification and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// An endpoint declaration could not be registered.
    Registration,
    /// No endpoint matches the request.
    NotFound,
    /// The request could not be bound to the endpoint.
    BadRequest,
    /// No security scheme authorized the request.
    Unauthorized,
    /// Server-side failure.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Registration | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Standard error type for Hermes.
///
/// # Example
///
/// ```
/// use hermes_core::{ErrorCategory, HermesError};
///
/// fn lookup(id: i64) -> Result<String, HermesError> {
///     if id < 0 {
///         return Err(HermesError::bad_request("id must not be negative"));
///     }
///     Ok(format!("user-{id}"))
/// }
///
/// let err = lookup(-1).unwrap_err();
/// assert_eq!(err.category(), ErrorCategory::BadRequest);
/// ```
#[derive(Error, Debug)]
pub enum HermesError {
    /// An endpoint declaration was rejected at registration time.
    #[error("Registration error: {message}")]
    Registration {
        /// Human-readable error message.
        message: String,
    },

    /// No registered endpoint matches the request.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
        /// The request method, when known.
        method: Option<String>,
        /// The request path, when known.
        path: Option<String>,
    },

    /// The request is malformed for the matched endpoint.
    #[error("Bad request: {message}")]
    BadRequest {
        /// Human-readable error message.
        message: String,
        /// The argument that failed to bind, if any.
        field: Option<String>,
    },

    /// No declared security scheme authorized the request.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Human-readable error message.
        message: String,
    },

    /// Internal server error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl HermesError {
    /// Creates a registration error.
    #[must_use]
    pub fn registration(message: impl Into<String>) -> Self {
        Self::Registration {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            method: None,
            path: None,
        }
    }

    /// Creates the error returned when no route matches a request.
    #[must_use]
    pub fn route_not_found(method: impl Into<String>, path: impl Into<String>) -> Self {
        let method = method.into();
        let path = path.into();
        Self::NotFound {
            message: format!("no endpoint matches {method} {path}"),
            method: Some(method),
            path: Some(path),
        }
    }

    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a bad request error naming the offending argument.
    #[must_use]
    pub fn bad_request_for(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Registration { .. } => ErrorCategory::Registration,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::BadRequest { .. } => ErrorCategory::BadRequest,
            Self::Unauthorized { .. } => ErrorCategory::Unauthorized,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Converts this error to a serializable error envelope.
    ///
    /// Internal errors never leak their source chain to the client.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
                details: self.error_details(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Registration { .. } => "REGISTRATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::BadRequest { .. } => "BAD_REQUEST",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            Self::NotFound {
                method: Some(method),
                path: Some(path),
                ..
            } => Some(serde_json::json!({
                "method": method,
                "path": path
            })),
            Self::BadRequest {
                field: Some(field), ..
            } => Some(serde_json::json!({
                "field": field
            })),
            _ => None,
        }
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
    /// Additional error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
