//! Error types for the authorization crate.

use hermes_core::HermesError;
use thiserror::Error;

/// Result type for authorization checks.
pub type AuthzResult<T> = Result<T, AuthzError>;

/// An authorization check failed.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum AuthzError {
    /// No required scheme accepted the request.
    #[error("access denied to {endpoint}: none of [{}] authorized the request", schemes.join(", "))]
    Denied {
        /// Operation id of the endpoint.
        endpoint: String,
        /// Schemes that were tried, in order.
        schemes: Vec<String>,
    },

    /// A scheme or its authorizer disappeared after validation.
    #[error("security scheme {scheme:?} is not registered")]
    UnknownScheme {
        /// The scheme name.
        scheme: String,
    },
}

impl AuthzError {
    /// Creates a denial.
    pub fn denied(endpoint: impl Into<String>, schemes: Vec<String>) -> Self {
        Self::Denied {
            endpoint: endpoint.into(),
            schemes,
        }
    }
}

impl From<AuthzError> for HermesError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Denied { .. } => Self::unauthorized(err.to_string()),
            AuthzError::UnknownScheme { .. } => Self::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_denied_is_401() {
        let err = AuthzError::denied("users.get", vec!["oauth".into(), "key".into()]);
        assert!(err.to_string().contains("oauth, key"));
        let hermes: HermesError = err.into();
        assert_eq!(hermes.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_unknown_scheme_is_500() {
        let hermes: HermesError = AuthzError::UnknownScheme { scheme: "x".into() }.into();
        assert_eq!(hermes.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
