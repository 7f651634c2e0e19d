//! Validation schemas for configuration namespaces.
//!
//! A schema turns the raw value found at a path into its validated,
//! normalized form. Schemas receive the [`ValidationContext`] so defaults and
//! checks may depend on the runtime mode or package metadata.
//!
//! # Provided Schemas
//! - [`SerdeSchema`]: deserialize into a typed struct, then run [`Validate`]
//! - [`FnSchema`]: closure-backed, for ad-hoc namespaces
//! - [`AnySchema`]: accepts any present value unchanged

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::env::ValidationContext;
use crate::config::error::{FieldError, ValidationError};

/// A validator registered for one config namespace.
pub trait Schema: Send + Sync {
    /// Validate `raw` (absent when the path does not exist) and return the
    /// normalized value. `label` identifies the namespace in error messages.
    fn validate(
        &self,
        raw: Option<&Value>,
        ctx: &ValidationContext,
        label: &str,
    ) -> Result<Value, ValidationError>;
}

/// Semantic checks run after deserialization.
pub trait Validate {
    /// Return every failing field, not just the first.
    fn validate(&self, _ctx: &ValidationContext) -> Result<(), Vec<FieldError>> {
        Ok(())
    }
}

/// Schema backed by a serde type.
///
/// Absent input is deserialized from an empty object, so types using
/// `#[serde(default)]` validate to their defaults.
pub struct SerdeSchema<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeSchema<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SerdeSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdeSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdeSchema")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Schema for SerdeSchema<T>
where
    T: DeserializeOwned + Serialize + Validate,
{
    fn validate(
        &self,
        raw: Option<&Value>,
        ctx: &ValidationContext,
        label: &str,
    ) -> Result<Value, ValidationError> {
        let input = raw.cloned().unwrap_or_else(|| Value::Object(Map::new()));
        let typed: T = serde_json::from_value(input)
            .map_err(|e| ValidationError::new(label, vec![FieldError::new("", e.to_string())]))?;

        Validate::validate(&typed, ctx).map_err(|errors| ValidationError::new(label, errors))?;

        serde_json::to_value(&typed)
            .map_err(|e| ValidationError::new(label, vec![FieldError::new("", e.to_string())]))
    }
}

/// Schema backed by a closure.
pub struct FnSchema<F> {
    check: F,
}

impl<F> FnSchema<F>
where
    F: Fn(Option<&Value>, &ValidationContext) -> Result<Value, Vec<FieldError>> + Send + Sync,
{
    pub fn new(check: F) -> Self {
        Self { check }
    }
}

impl<F> Schema for FnSchema<F>
where
    F: Fn(Option<&Value>, &ValidationContext) -> Result<Value, Vec<FieldError>> + Send + Sync,
{
    fn validate(
        &self,
        raw: Option<&Value>,
        ctx: &ValidationContext,
        label: &str,
    ) -> Result<Value, ValidationError> {
        (self.check)(raw, ctx).map_err(|errors| ValidationError::new(label, errors))
    }
}

/// Accepts any present value as-is and rejects absence.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnySchema;

impl Schema for AnySchema {
    fn validate(
        &self,
        raw: Option<&Value>,
        _ctx: &ValidationContext,
        label: &str,
    ) -> Result<Value, ValidationError> {
        raw.cloned().ok_or_else(|| {
            ValidationError::new(
                label,
                vec![FieldError::new("", "expected a value but got [undefined]")],
            )
        })
    }
}
