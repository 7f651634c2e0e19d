//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::error::ConfigError;
use crate::config::snapshot::Config;

/// Load a TOML file into a raw config snapshot.
///
/// No schema validation happens here; namespaces are validated by the
/// schemas registered with the config service.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = Config::from_toml_str(&content)?;

    tracing::debug!(
        path = %path.display(),
        keys = config.get_flattened_paths().len(),
        "Loaded config file"
    );
    Ok(config)
}
