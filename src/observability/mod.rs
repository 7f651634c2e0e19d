//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Config service produces:
//!     → logging.rs (structured log events, `config` target)
//!     → metrics.rs (handled paths, validation failures, published snapshots)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Metrics go through the `metrics` facade; no recorder means no cost

pub mod logging;
pub mod metrics;
