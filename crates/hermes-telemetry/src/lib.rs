//! Logging setup for Hermes services.
//!
//! Hermes components log through `tracing`; this crate installs the
//! subscriber that renders those events.
//!
//! - [`LogConfig`] / [`LogFormat`] - filter directive and output format
//! - [`init_logging`] - installs the global subscriber
//!
//! # Example
//!
//! ```rust
//! use hermes_telemetry::{LogConfig, LogFormat};
//!
//! let config = LogConfig::default()
//!     .with_level("hermes_server=debug,info")
//!     .with_format(LogFormat::Compact);
//! assert_eq!(config.format.to_string(), "compact");
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
