//! Shared helpers for config service integration tests.

use std::future::Future;
use std::time::Duration;

use config_service::config::{Config, ConfigService, ConfigSource, Env};
use serde_json::Value;

/// A source holding `raw` and a development-mode service over it.
pub fn service_with(raw: Value) -> (ConfigSource, ConfigService) {
    let source = ConfigSource::with_initial(Config::new(raw));
    let service = ConfigService::new(source.subscribe(), Env::development());
    (source, service)
}

/// Resolve `fut` or panic after a short deadline.
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(2), fut)
        .await
        .expect("timed out waiting for config emission")
}

/// True if `fut` is still pending after a short grace period.
#[allow(dead_code)]
pub async fn stays_pending<F: Future>(fut: F) -> bool {
    tokio::time::timeout(Duration::from_millis(100), fut).await.is_err()
}
