//! Configuration paths.
//!
//! # Responsibilities
//! - Represent a location in the config tree (dotted string or segment list)
//! - Normalize both forms to one canonical dot-joined key
//! - Decide whether two paths intersect (ancestor/descendant relation)
//!
//! # Design Decisions
//! - Canonical string is the only key used internally
//! - Intersection is segment aware: `a.b` intersects `a.b.c` but not `a.bc`
//! - Array and string forms compare equal iff their canonical forms do

use std::fmt;

/// A location in the configuration tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConfigPath {
    /// `"server.ssl.enabled"`
    Dotted(String),
    /// `["server", "ssl", "enabled"]`
    Segments(Vec<String>),
}

impl ConfigPath {
    /// Canonical dot-joined form used as the lookup key.
    pub fn canonical(&self) -> String {
        match self {
            ConfigPath::Dotted(path) => path.clone(),
            ConfigPath::Segments(segments) => segments.join("."),
        }
    }

    /// Individual segments of the path.
    ///
    /// Segment elements containing dots are split, so `["a.b"]`, `["a", "b"]`
    /// and `"a.b"` all address the same location as their canonical key.
    pub fn segments(&self) -> Vec<&str> {
        match self {
            ConfigPath::Dotted(path) if path.is_empty() => Vec::new(),
            ConfigPath::Dotted(path) => path.split('.').collect(),
            ConfigPath::Segments(segments) => segments
                .iter()
                .flat_map(|segment| segment.split('.'))
                .collect(),
        }
    }

    /// The implicit `enabled` flag below this path, keeping the representation.
    pub fn enabled_path(&self) -> ConfigPath {
        match self {
            ConfigPath::Dotted(path) => ConfigPath::Dotted(format!("{}.enabled", path)),
            ConfigPath::Segments(segments) => {
                let mut segments = segments.clone();
                segments.push("enabled".to_string());
                ConfigPath::Segments(segments)
            }
        }
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl From<&str> for ConfigPath {
    fn from(path: &str) -> Self {
        ConfigPath::Dotted(path.to_string())
    }
}

impl From<String> for ConfigPath {
    fn from(path: String) -> Self {
        ConfigPath::Dotted(path)
    }
}

impl From<Vec<String>> for ConfigPath {
    fn from(segments: Vec<String>) -> Self {
        ConfigPath::Segments(segments)
    }
}

impl From<&[&str]> for ConfigPath {
    fn from(segments: &[&str]) -> Self {
        ConfigPath::Segments(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ConfigPath {
    fn from(segments: [&str; N]) -> Self {
        ConfigPath::Segments(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl From<&ConfigPath> for ConfigPath {
    fn from(path: &ConfigPath) -> Self {
        path.clone()
    }
}

/// Returns true if one path is a segment-wise prefix of the other.
pub fn has_config_path_intersection(left: &str, right: &str) -> bool {
    if left.is_empty() || right.is_empty() {
        return false;
    }
    let (shorter, longer) = if left.len() <= right.len() {
        (left, right)
    } else {
        (right, left)
    };
    match longer.strip_prefix(shorter) {
        Some("") => true,
        Some(rest) => rest.starts_with('.'),
        None => false,
    }
}
