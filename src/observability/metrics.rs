//! Config service metrics.
//!
//! # Metrics
//! - `config_paths_handled_total` (counter): reads recorded in the handled-paths log
//! - `config_validation_failures_total` (counter): schema rejections
//! - `config_snapshots_published_total` (counter): snapshots pushed to subscribers
//!
//! Counters are incremented where the events happen; this module only
//! registers their descriptions with whichever recorder is installed.

use metrics::{describe_counter, Unit};

pub const PATHS_HANDLED: &str = "config_paths_handled_total";
pub const VALIDATION_FAILURES: &str = "config_validation_failures_total";
pub const SNAPSHOTS_PUBLISHED: &str = "config_snapshots_published_total";

/// Describe all config service metrics.
pub fn describe_metrics() {
    describe_counter!(PATHS_HANDLED, Unit::Count, "Config paths marked as handled");
    describe_counter!(VALIDATION_FAILURES, Unit::Count, "Config values rejected by a schema");
    describe_counter!(SNAPSHOTS_PUBLISHED, Unit::Count, "Config snapshots published");
}
