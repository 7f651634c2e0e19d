//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::loader::load_config;
use crate::config::source::ConfigSource;

/// Watches a config file and publishes a fresh snapshot on every change.
pub struct ConfigWatcher {
    path: PathBuf,
    source: ConfigSource,
}

impl ConfigWatcher {
    /// Create a watcher publishing into `source`.
    pub fn new(path: &Path, source: ConfigSource) -> Self {
        Self {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let source = self.source.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(
                            path = %path.display(),
                            "Config file change detected, reloading..."
                        );
                        match load_config(&path) {
                            Ok(config) => source.publish(config),
                            Err(e) => {
                                tracing::error!(
                                    error = %e,
                                    "Failed to reload config, keeping current configuration"
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            NotifyConfig::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}
