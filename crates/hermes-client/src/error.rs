//! Client error types.

use hermes_extract::MarshalError;
use http::StatusCode;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors returned by [`RequestBuilder`](crate::RequestBuilder).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The URL does not parse.
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// A header name or value is not valid.
    #[error("invalid header {0:?}")]
    InvalidHeader(String),

    /// No marshaller is registered for the content type.
    #[error("no marshaller registered for {0:?}")]
    UnsupportedMime(String),

    /// The body could not be converted.
    #[error(transparent)]
    Marshal(#[from] MarshalError),

    /// The value does not match the expected type.
    #[error("failed to map body: {0}")]
    Json(#[from] serde_json::Error),

    /// Connection, protocol or timeout failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response status was not the one the caller expected.
    #[error("unexpected status {status}")]
    UnexpectedStatus {
        /// The status received.
        status: StatusCode,
        /// The response body, lossily decoded.
        body: String,
    },
}

impl ClientError {
    /// Returns the response status for [`ClientError::UnexpectedStatus`].
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_status_display() {
        let err = ClientError::UnexpectedStatus {
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "unexpected status 404 Not Found");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(ClientError::UnsupportedMime("a/b".into()).status(), None);
    }
}
