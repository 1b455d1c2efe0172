//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive does not parse.
    #[error("invalid log filter {filter:?}: {reason}")]
    InvalidFilter {
        /// The rejected directive.
        filter: String,
        /// Parser message.
        reason: String,
    },

    /// The log format name is unknown.
    #[error("unknown log format {0:?}, expected json, pretty or compact")]
    UnknownFormat(String),

    /// A global subscriber is already installed.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::UnknownFormat("xml".to_string());
        assert_eq!(err.to_string(), "unknown log format \"xml\", expected json, pretty or compact");

        let err = TelemetryError::InvalidFilter {
            filter: "hermes=loud".to_string(),
            reason: "bad level".to_string(),
        };
        assert!(err.to_string().starts_with("invalid log filter \"hermes=loud\""));
    }
}
