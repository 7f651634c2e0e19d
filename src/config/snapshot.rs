//! Immutable configuration snapshots.
//!
//! # Responsibilities
//! - Hold one whole-tree view of the raw configuration
//! - Answer `has` / `get` for a [`ConfigPath`]
//! - Enumerate every leaf path (flattened)
//!
//! # Design Decisions
//! - Backed by a `serde_json::Value` object, never mutated after construction
//! - Only objects are descended into; arrays and scalars are leaves
//! - Empty objects contribute no leaf path

use serde_json::{Map, Value};

use crate::config::error::ConfigError;
use crate::config::path::ConfigPath;

/// One immutable snapshot of the raw configuration tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    root: Map<String, Value>,
}

impl Config {
    /// Build a snapshot from a JSON value. Non-object roots yield an empty tree.
    pub fn new(raw: Value) -> Self {
        match raw {
            Value::Object(root) => Self { root },
            other => {
                tracing::warn!(
                    kind = %value_kind(&other),
                    "Config root is not an object, using empty config"
                );
                Self::default()
            }
        }
    }

    /// Parse a TOML document into a snapshot.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content)?;
        Self::from_toml(toml::Value::Table(table))
    }

    /// Convert a parsed TOML value into a snapshot.
    ///
    /// Fails on `nan` / `inf` floats, which have no JSON representation.
    pub fn from_toml(raw: toml::Value) -> Result<Self, ConfigError> {
        Ok(Self::new(toml_to_json("", raw)?))
    }

    /// Returns true if a value exists at `path`.
    pub fn has(&self, path: impl Into<ConfigPath>) -> bool {
        self.get(path).is_some()
    }

    /// Returns the raw value at `path`, if any.
    pub fn get(&self, path: impl Into<ConfigPath>) -> Option<&Value> {
        let path = path.into();
        let segments = path.segments();
        let (first, rest) = segments.split_first()?;
        let mut current = self.root.get(*first)?;
        for segment in rest {
            current = current.as_object()?.get(*segment)?;
        }
        Some(current)
    }

    /// Every leaf path of the tree, in key order.
    pub fn get_flattened_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for (key, value) in &self.root {
            flatten_into(key, value, &mut paths);
        }
        paths
    }
}

impl From<Value> for Config {
    fn from(raw: Value) -> Self {
        Self::new(raw)
    }
}

fn flatten_into(prefix: &str, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(&format!("{}.{}", prefix, key), child, out);
            }
        }
        _ => out.push(prefix.to_string()),
    }
}

fn toml_to_json(key: &str, raw: toml::Value) -> Result<Value, ConfigError> {
    let value = match raw {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => match serde_json::Number::from_f64(f) {
            Some(number) => Value::Number(number),
            None => return Err(ConfigError::NonFiniteFloat { key: key.to_string() }),
        },
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| toml_to_json(&format!("{}[{}]", key, i), item))
                .collect::<Result<_, _>>()?,
        ),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(child, value)| {
                    let path = if key.is_empty() {
                        child.clone()
                    } else {
                        format!("{}.{}", key, child)
                    };
                    toml_to_json(&path, value).map(|value| (child, value))
                })
                .collect::<Result<_, _>>()?,
        ),
    };
    Ok(value)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
