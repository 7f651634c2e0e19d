//! Process environment handed to every schema validation.
//!
//! # Responsibilities
//! - Describe the runtime mode (development / production)
//! - Carry static package metadata (version, build info)
//! - Produce the [`ValidationContext`] passed to schemas
//!
//! # Design Decisions
//! - Static for the process lifetime, never stored per path

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Runtime mode flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode {
    pub name: String,
    pub dev: bool,
    pub prod: bool,
}

impl Mode {
    pub fn development() -> Self {
        Self {
            name: "development".to_string(),
            dev: true,
            prod: false,
        }
    }

    pub fn production() -> Self {
        Self {
            name: "production".to_string(),
            dev: false,
            prod: true,
        }
    }
}

/// Static package metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub version: String,
    pub branch: String,
    pub build_num: u64,
    pub build_sha: String,
    pub dist: bool,
}

impl Default for PackageInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            branch: "main".to_string(),
            build_num: 0,
            build_sha: "unknown".to_string(),
            dist: false,
        }
    }
}

/// Environment the service runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Env {
    pub mode: Mode,
    pub package_info: PackageInfo,
}

impl Env {
    pub fn new(mode: Mode, package_info: PackageInfo) -> Self {
        Self { mode, package_info }
    }

    /// Development environment with default package info.
    pub fn development() -> Self {
        Self::new(Mode::development(), PackageInfo::default())
    }

    /// Production environment with default package info.
    pub fn production() -> Self {
        Self::new(Mode::production(), PackageInfo::default())
    }

    /// Context passed as auxiliary parameters to every validation call.
    pub fn validation_context(&self) -> ValidationContext {
        ValidationContext {
            dev: self.mode.dev,
            prod: self.mode.prod,
            package: self.package_info.clone(),
        }
    }
}

/// Contextual parameters available to schemas while validating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationContext {
    pub dev: bool,
    pub prod: bool,
    pub package: PackageInfo,
}

impl ValidationContext {
    /// Flat map of mode flags merged with package metadata.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = match serde_json::to_value(&self.package) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        map.insert("dev".to_string(), Value::Bool(self.dev));
        map.insert("prod".to_string(), Value::Bool(self.prod));
        map
    }
}
