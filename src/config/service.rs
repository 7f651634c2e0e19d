//! The configuration service.
//!
//! # Responsibilities
//! - Register exactly one schema per namespace and fail fast on bad startup config
//! - Serve live, validated, de-duplicated views of a path
//! - Decide plugin enablement from `<path>.enabled`
//! - Record every path read so unused config can be reported after bootstrap
//!
//! # Data Flow
//! ```text
//! ConfigSource snapshots
//!     → project(path)
//!     → distinct (deep equality with the previous projection)
//!     → validate(schema, ValidationContext, label = canonical path)
//!     → deserialize into T
//!     → subscriber
//! ```
//!
//! # Design Decisions
//! - `ConfigService` is a cheap `Clone` handle; threaded explicitly, never global
//! - Missing schemas are detected when a value is validated, so a schema may be
//!   registered concurrently with the first subscription
//! - A failed validation ends that subscription; callers resubscribe to recover

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::stream::{self, Stream};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::env::{Env, ValidationContext};
use crate::config::error::ConfigError;
use crate::config::path::{has_config_path_intersection, ConfigPath};
use crate::config::schema::Schema;
use crate::config::snapshot::Config;
use crate::config::source::{first_snapshot, SnapshotReceiver, SnapshotSubscription};
use crate::observability::metrics::{PATHS_HANDLED, VALIDATION_FAILURES};

struct Inner {
    config_rx: SnapshotReceiver,
    env: Env,
    context: ValidationContext,
    schemas: DashMap<String, Arc<dyn Schema>>,
    /// Append-only log of every path read, in read order.
    handled_paths: Mutex<Vec<ConfigPath>>,
}

impl Inner {
    fn validate(&self, path: &ConfigPath, raw: Option<&Value>) -> Result<Value, ConfigError> {
        let namespace = path.canonical();
        let schema = self
            .schemas
            .get(&namespace)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ConfigError::MissingSchema {
                path: namespace.clone(),
            })?;

        schema.validate(raw, &self.context, &namespace).map_err(|err| {
            metrics::counter!(VALIDATION_FAILURES).increment(1);
            tracing::debug!(
                target: "config",
                path = %namespace,
                error = %err,
                "Config validation failed"
            );
            ConfigError::Validation(err)
        })
    }

    fn mark_as_handled(&self, path: ConfigPath) {
        tracing::debug!(target: "config", path = %path, "Marking config path as handled");
        metrics::counter!(PATHS_HANDLED).increment(1);
        self.handled_paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path);
    }

    fn handled_paths(&self) -> Vec<String> {
        self.handled_paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(ConfigPath::canonical)
            .collect()
    }
}

/// Validated, scoped access to a live configuration stream.
#[derive(Clone)]
pub struct ConfigService {
    inner: Arc<Inner>,
}

impl ConfigService {
    /// Create the service over a snapshot stream.
    pub fn new(config_rx: SnapshotReceiver, env: Env) -> Self {
        let context = env.validation_context();
        tracing::debug!(target: "config", mode = %env.mode.name, "Config service created");
        Self {
            inner: Arc::new(Inner {
                config_rx,
                env,
                context,
                schemas: DashMap::new(),
                handled_paths: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The environment validations run in.
    pub fn env(&self) -> &Env {
        &self.inner.env
    }

    /// Register the schema for `path` and validate the current config against it.
    ///
    /// Fails with [`ConfigError::DuplicateSchema`] if the namespace already has
    /// a schema; the existing registration is left untouched.
    pub async fn set_schema<S>(
        &self,
        path: impl Into<ConfigPath>,
        schema: S,
    ) -> Result<(), ConfigError>
    where
        S: Schema + 'static,
    {
        let path = path.into();
        let namespace = path.canonical();

        match self.inner.schemas.entry(namespace.clone()) {
            Entry::Occupied(_) => return Err(ConfigError::DuplicateSchema { path: namespace }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(schema));
            }
        }
        tracing::debug!(target: "config", path = %namespace, "Registered config schema");

        match self.at_path::<Value>(path).next().await {
            Some(result) => result.map(|_| ()),
            None => Err(ConfigError::SourceClosed),
        }
    }

    /// The full, unfiltered snapshot stream. Nothing is marked as handled.
    pub fn get_full_config(&self) -> SnapshotSubscription {
        SnapshotSubscription::new(self.inner.config_rx.clone())
    }

    /// Live, validated value at `path`.
    pub fn at_path<T: DeserializeOwned>(&self, path: impl Into<ConfigPath>) -> Subscription<T> {
        Subscription {
            distinct: self.distinct_config(path.into()),
            _marker: PhantomData,
        }
    }

    /// Like [`at_path`](Self::at_path), but yields `None` while the path is absent.
    pub fn optional_at_path<T: DeserializeOwned>(
        &self,
        path: impl Into<ConfigPath>,
    ) -> OptionalSubscription<T> {
        OptionalSubscription {
            distinct: self.distinct_config(path.into()),
            _marker: PhantomData,
        }
    }

    /// Whether the feature at `path` is enabled, based on `<path>.enabled`.
    ///
    /// A missing flag means enabled. When the flag is absent or `false` the
    /// whole `path` is marked handled; otherwise only the flag itself is.
    pub async fn is_enabled_at_path(
        &self,
        path: impl Into<ConfigPath>,
    ) -> Result<bool, ConfigError> {
        let path = path.into();
        let enabled_path = path.enabled_path();
        let config = self.current_snapshot().await?;

        match config.get(&enabled_path) {
            None => {
                self.inner.mark_as_handled(path);
                Ok(true)
            }
            Some(Value::Bool(false)) => {
                self.inner.mark_as_handled(path);
                Ok(false)
            }
            Some(_) => {
                self.inner.mark_as_handled(enabled_path);
                Ok(true)
            }
        }
    }

    /// Flattened paths of the current snapshot that nothing has read.
    pub async fn get_unused_paths(&self) -> Result<Vec<String>, ConfigError> {
        let (_, unused) = self.partition_paths().await?;
        Ok(unused)
    }

    /// Flattened paths of the current snapshot covered by a handled path.
    pub async fn get_used_paths(&self) -> Result<Vec<String>, ConfigError> {
        let (used, _) = self.partition_paths().await?;
        Ok(used)
    }

    /// Log every unused path at `warn` and return them.
    pub async fn log_unused_paths(&self) -> Result<Vec<String>, ConfigError> {
        let unused = self.get_unused_paths().await?;
        for path in &unused {
            tracing::warn!(target: "config", path = %path, "Config key is not used by any plugin");
        }
        Ok(unused)
    }

    /// Canonical form of every handled path, in read order.
    pub fn handled_paths(&self) -> Vec<String> {
        self.inner.handled_paths()
    }

    /// Namespaces with a registered schema, sorted.
    pub fn registered_schemas(&self) -> Vec<String> {
        let mut namespaces: Vec<String> = self
            .inner
            .schemas
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        namespaces.sort();
        namespaces
    }

    async fn current_snapshot(&self) -> Result<Arc<Config>, ConfigError> {
        let mut rx = self.inner.config_rx.clone();
        first_snapshot(&mut rx).await
    }

    async fn partition_paths(&self) -> Result<(Vec<String>, Vec<String>), ConfigError> {
        let config = self.current_snapshot().await?;
        let handled = self.inner.handled_paths();

        Ok(config
            .get_flattened_paths()
            .into_iter()
            .partition(|path| is_path_handled(path, &handled)))
    }

    fn distinct_config(&self, path: ConfigPath) -> DistinctConfig {
        self.inner.mark_as_handled(path.clone());
        DistinctConfig {
            rx: self.inner.config_rx.clone(),
            inner: Arc::clone(&self.inner),
            path,
            previous: None,
            primed: false,
            finished: false,
        }
    }
}

/// A path counts as handled if it intersects any handled path.
fn is_path_handled(path: &str, handled_paths: &[String]) -> bool {
    handled_paths
        .iter()
        .any(|handled| has_config_path_intersection(path, handled))
}

/// Projection of the snapshot stream onto one path, skipping repeats.
struct DistinctConfig {
    rx: SnapshotReceiver,
    inner: Arc<Inner>,
    path: ConfigPath,
    /// Last emitted projection; `Some(None)` means "emitted absent".
    previous: Option<Option<Value>>,
    primed: bool,
    finished: bool,
}

impl DistinctConfig {
    async fn next(&mut self) -> Option<Option<Value>> {
        if self.finished {
            return None;
        }
        loop {
            let snapshot = if !self.primed {
                let first = first_snapshot(&mut self.rx).await.ok();
                self.primed = true;
                first
            } else {
                match self.rx.changed().await {
                    Ok(()) => self.rx.borrow_and_update().clone(),
                    Err(_) => None,
                }
            };
            let Some(snapshot) = snapshot else {
                if self.rx.has_changed().is_err() {
                    self.finished = true;
                    return None;
                }
                continue;
            };

            let projected = snapshot.get(&self.path).cloned();
            if self.previous.as_ref() == Some(&projected) {
                continue;
            }
            self.previous = Some(projected.clone());
            return Some(projected);
        }
    }

    fn validate<T: DeserializeOwned>(&mut self, raw: Option<&Value>) -> Result<T, ConfigError> {
        let result = self.inner.validate(&self.path, raw).and_then(|value| {
            serde_json::from_value(value).map_err(|source| ConfigError::Deserialize {
                path: self.path.canonical(),
                source,
            })
        });
        if result.is_err() {
            self.finished = true;
        }
        result
    }

    /// Reopen after a validation failure. Snapshots published since then are
    /// still pending on the receiver, and the rejected value stays the baseline.
    fn resume(&mut self) {
        if self.rx.has_changed().is_ok() {
            self.finished = false;
        }
    }
}

/// Live stream of the validated value at a path.
///
/// Dropping the subscription unsubscribes it.
pub struct Subscription<T> {
    distinct: DistinctConfig,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Subscription<T> {
    /// Next distinct validated value, or `None` once the stream has ended.
    ///
    /// After an error the subscription is finished.
    pub async fn next(&mut self) -> Option<Result<T, ConfigError>> {
        let raw = self.distinct.next().await?;
        Some(self.distinct.validate(raw.as_ref()))
    }

    /// Continue after an error.
    ///
    /// The next item is the first later value that differs from the rejected
    /// one, including a change published before `resume` was called.
    pub fn resume(&mut self) {
        self.distinct.resume();
    }

    /// Adapt into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Result<T, ConfigError>> {
        stream::unfold(self, |mut sub| async move {
            let item = sub.next().await?;
            Some((item, sub))
        })
    }
}

/// Live stream of the validated value at a path, `None` while it is absent.
///
/// The schema is only consulted when a value is present.
pub struct OptionalSubscription<T> {
    distinct: DistinctConfig,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> OptionalSubscription<T> {
    /// Next distinct value, or `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<Result<Option<T>, ConfigError>> {
        match self.distinct.next().await? {
            None => Some(Ok(None)),
            Some(raw) => Some(self.distinct.validate(Some(&raw)).map(Some)),
        }
    }

    /// Continue after an error, see [`Subscription::resume`].
    pub fn resume(&mut self) {
        self.distinct.resume();
    }

    /// Adapt into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Result<Option<T>, ConfigError>> {
        stream::unfold(self, |mut sub| async move {
            let item = sub.next().await?;
            Some((item, sub))
        })
    }
}
