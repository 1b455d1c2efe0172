//! Typed configuration for Hermes services.
//!
//! - TOML and JSON files
//! - `PREFIX__SECTION__KEY` environment overrides
//! - Unknown fields are rejected
//! - Layered: defaults, then file, then environment
//!
//! # Example
//!
//! ```no_run
//! use hermes_config::ConfigLoader;
//! use hermes_server::Dispatcher;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new()
//!     .with_file("hermes.toml")?
//!     .with_env_prefix("HERMES")
//!     .load()?;
//!
//! hermes_telemetry::init_logging(&config.log_config())?;
//! let dispatcher = Dispatcher::builder()
//!     .config(config.server_config())
//!     .multipart(config.multipart_config())
//!     .build()?;
//! # Ok(())
//! # }
//! ```
//!
//! # File format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! root_path = "/api"
//! allow_origin = "https://app.example.com"
//! max_body_bytes = 2097152
//! shutdown_timeout_secs = 30
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [multipart]
//! max_body_size = 10485760
//! max_field_size = 5242880
//! max_fields = 100
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{HermesConfig, LoggingSection, MultipartSection, ServerSection};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use hermes_telemetry::LogFormat;
