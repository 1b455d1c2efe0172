//! Binding error types.
//!
//! Every binding failure is the client's fault and answers `400 Bad Request`;
//! the error records where the bad input came from so the envelope and the
//! logs can say which argument was rejected.

use hermes_core::HermesError;
use http::StatusCode;
use std::fmt;

/// Where the offending input was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindSource {
    /// A path segment.
    Path,
    /// The query string.
    Query,
    /// The request body.
    Body,
    /// The `Content-Type` header.
    ContentType,
}

impl fmt::Display for BindSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Body => write!(f, "body"),
            Self::ContentType => write!(f, "content-type"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindErrorKind {
    /// Percent-encoding or query syntax is broken.
    Malformed,
    /// A value does not parse as its declared type.
    InvalidType,
    /// The body could not be decoded or has the wrong shape.
    DeserializationFailed,
    /// The body exceeds the configured limit.
    PayloadTooLarge,
    /// The request's content type is not accepted by the endpoint.
    UnsupportedMediaType,
}

/// A request could not be bound to the matched endpoint.
///
/// # Example
///
/// ```rust
/// use hermes_extract::{BindError, BindSource};
/// use http::StatusCode;
///
/// let err = BindError::invalid_type(BindSource::Path, "id", "cannot convert \"abc\" to int");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.bind_source(), BindSource::Path);
/// assert!(err.to_string().contains("id"));
/// ```
#[derive(Debug, Clone)]
pub struct BindError {
    bind_source: BindSource,
    kind: BindErrorKind,
    field: Option<String>,
    message: String,
}

impl BindError {
    /// Creates an error for broken percent-encoding or query syntax.
    #[must_use]
    pub fn malformed(source: BindSource, details: impl Into<String>) -> Self {
        Self {
            bind_source: source,
            kind: BindErrorKind::Malformed,
            message: format!("malformed {source}: {}", details.into()),
            field: None,
        }
    }

    /// Creates an error for a value that does not parse as its type.
    #[must_use]
    pub fn invalid_type(source: BindSource, field: impl Into<String>, details: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            bind_source: source,
            kind: BindErrorKind::InvalidType,
            message: format!("invalid {source} parameter '{field}': {}", details.into()),
            field: Some(field),
        }
    }

    /// Creates an error for a body that could not be decoded.
    #[must_use]
    pub fn deserialization_failed(details: impl Into<String>) -> Self {
        Self {
            bind_source: BindSource::Body,
            kind: BindErrorKind::DeserializationFailed,
            message: format!("failed to decode body: {}", details.into()),
            field: Some("body".to_string()),
        }
    }

    /// Creates an error for a body over the size limit.
    #[must_use]
    pub fn payload_too_large(max_size: usize, actual_size: usize) -> Self {
        Self {
            bind_source: BindSource::Body,
            kind: BindErrorKind::PayloadTooLarge,
            message: format!("payload too large: max {max_size} bytes, got {actual_size} bytes"),
            field: None,
        }
    }

    /// Creates an error for a content type the endpoint does not consume.
    #[must_use]
    pub fn unsupported_media_type(accepted: &[String], actual: &str) -> Self {
        Self {
            bind_source: BindSource::ContentType,
            kind: BindErrorKind::UnsupportedMediaType,
            message: format!(
                "unsupported content type '{actual}', expected one of [{}]",
                accepted.join(", ")
            ),
            field: None,
        }
    }

    /// Returns where the input came from.
    #[must_use]
    pub const fn bind_source(&self) -> BindSource {
        self.bind_source
    }

    /// Returns the offending argument, if known.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// Returns a machine-readable code for logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self.kind {
            BindErrorKind::Malformed => "MALFORMED_REQUEST",
            BindErrorKind::InvalidType => "INVALID_PARAMETER",
            BindErrorKind::DeserializationFailed => "DESERIALIZATION_FAILED",
            BindErrorKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            BindErrorKind::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
        }
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BindError {}

impl From<BindError> for HermesError {
    fn from(err: BindError) -> Self {
        match err.field {
            Some(field) => Self::bad_request_for(field, err.message),
            None => Self::bad_request(err.message),
        }
    }
}
