//! Configuration error types.

use std::fmt;

use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted field location relative to the validated namespace (empty for the root).
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "[{}]: {}", self.field, self.message)
        }
    }
}

/// A schema rejected the value at a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Canonical path of the validated namespace.
    pub label: String,
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(label: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            label: label.into(),
            errors,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[config validation of [{}]]: ", self.label)?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Errors surfaced by the configuration service and its loaders.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Validation schema for {path} was already registered.")]
    DuplicateSchema { path: String },

    #[error("No validation schema has been defined for {path}")]
    MissingSchema { path: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Validated config at {path} could not be converted: {source}")]
    Deserialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config source closed before a snapshot was available")]
    SourceClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Parse error: {key} is not a finite number")]
    NonFiniteFloat { key: String },
}
