//! Validated, live configuration for plugin-based applications.

pub mod config;
pub mod namespaces;
pub mod observability;

pub use config::{Config, ConfigError, ConfigPath, ConfigService, ConfigSource, Env};
