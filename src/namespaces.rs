//! Built-in configuration namespaces.
//!
//! These are the schemas the binary registers itself (`server`, `logging`).
//! Plugins register their own namespaces the same way.

use serde::{Deserialize, Serialize};

use crate::config::{FieldError, SerdeSchema, Validate, ValidationContext};

/// `server` namespace.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Maximum request payload in bytes.
    pub max_payload_bytes: usize,

    /// TLS settings.
    pub ssl: SslConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5601,
            max_payload_bytes: 1024 * 1024, // 1MB
            ssl: SslConfig::default(),
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self, _ctx: &ValidationContext) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push(FieldError::new("port", "must be greater than 0"));
        }
        if self.host.is_empty() {
            errors.push(FieldError::new("host", "must not be empty"));
        }
        if self.max_payload_bytes == 0 {
            errors.push(FieldError::new("max_payload_bytes", "must be greater than 0"));
        }
        if self.ssl.enabled {
            if self.ssl.certificate.is_none() {
                errors.push(FieldError::new("ssl.certificate", "must be set when ssl is enabled"));
            }
            if self.ssl.key.is_none() {
                errors.push(FieldError::new("ssl.key", "must be set when ssl is enabled"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// TLS configuration for the server.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SslConfig {
    pub enabled: bool,

    /// Path to certificate file (PEM).
    pub certificate: Option<String>,

    /// Path to private key file (PEM).
    pub key: Option<String>,
}

/// `logging` namespace.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Silence all output.
    pub silent: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            silent: false,
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Validate for LoggingConfig {
    fn validate(&self, ctx: &ValidationContext) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if !LOG_LEVELS.contains(&self.level.as_str()) {
            errors.push(FieldError::new(
                "level",
                format!("expected one of [{}] but got [{}]", LOG_LEVELS.join(", "), self.level),
            ));
        }
        if ctx.prod && self.level == "trace" {
            errors.push(FieldError::new("level", "trace logging is not allowed in production"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

pub fn server_schema() -> SerdeSchema<ServerConfig> {
    SerdeSchema::new()
}

pub fn logging_schema() -> SerdeSchema<LoggingConfig> {
    SerdeSchema::new()
}
