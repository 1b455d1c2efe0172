//! Configuration sections.
//!
//! Every section rejects unknown fields and fills missing ones from its
//! defaults, so a file only names what it changes.

use hermes_extract::MultipartConfig;
use hermes_server::{ServerConfig, DEFAULT_HTTP_ADDR, DEFAULT_MAX_BODY_BYTES, DEFAULT_SHUTDOWN_TIMEOUT_SECS};
use hermes_telemetry::{create_env_filter, LogConfig, LogFormat};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::ConfigError;

/// Complete Hermes configuration.
///
/// ```
/// use hermes_config::HermesConfig;
///
/// let config = HermesConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HermesConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Multipart body limits.
    #[serde(default)]
    pub multipart: MultipartSection,
}

impl HermesConfig {
    /// Debug level, pretty output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LoggingSection {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                ..LoggingSection::default()
            },
            ..Self::default()
        }
    }

    /// Info level, JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Checks values that deserialize fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid("server.max_body_bytes", "must be greater than zero"));
        }
        if matches!(&self.server.allow_origin, Some(origin) if origin.trim().is_empty()) {
            return Err(ConfigError::invalid("server.allow_origin", "must not be blank"));
        }
        if self.logging.enabled {
            create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid("logging.level", e.to_string()))?;
        }
        let multipart = &self.multipart;
        if multipart.max_fields == 0 {
            return Err(ConfigError::invalid("multipart.max_fields", "must be greater than zero"));
        }
        if multipart.max_field_size > multipart.max_body_size {
            return Err(ConfigError::invalid(
                "multipart.max_field_size",
                "must not exceed multipart.max_body_size",
            ));
        }
        Ok(())
    }

    /// Builds the server configuration.
    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        let mut builder = ServerConfig::builder()
            .http_addr(&self.server.http_addr)
            .root_path(&self.server.root_path)
            .max_body_bytes(self.server.max_body_bytes)
            .shutdown_timeout(Duration::from_secs(self.server.shutdown_timeout_secs));
        if let Some(origin) = &self.server.allow_origin {
            builder = builder.allow_origin(origin);
        }
        builder.build()
    }

    /// Builds the logging configuration.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            format: self.logging.format,
            ..LogConfig::default()
        }
    }

    /// Builds the multipart limits.
    #[must_use]
    pub fn multipart_config(&self) -> MultipartConfig {
        MultipartConfig::new()
            .max_body_size(self.multipart.max_body_size)
            .max_field_size(self.multipart.max_field_size)
            .max_fields(self.multipart.max_fields)
    }
}

/// `[server]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Bind address.
    pub http_addr: String,

    /// Prefix prepended to every service root.
    pub root_path: String,

    /// Enables CORS for this origin.
    pub allow_origin: Option<String>,

    /// Largest accepted request body.
    pub max_body_bytes: usize,

    /// Grace period for open connections on shutdown.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            root_path: String::new(),
            allow_origin: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Whether to install a subscriber at all.
    pub enabled: bool,

    /// Filter directive.
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

/// `[multipart]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MultipartSection {
    /// Largest multipart body.
    pub max_body_size: usize,

    /// Largest single part.
    pub max_field_size: usize,

    /// Most parts accepted.
    pub max_fields: usize,
}

impl Default for MultipartSection {
    fn default() -> Self {
        let limits = MultipartConfig::default();
        Self {
            max_body_size: limits.max_body_size,
            max_field_size: limits.max_field_size,
            max_fields: limits.max_fields,
        }
    }
}
