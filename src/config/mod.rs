//! Configuration service subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) / in-memory tree
//!     → loader.rs (parse into an immutable Config snapshot)
//!     → source.rs (publish; latest snapshot shared via watch channel)
//!     → service.rs (project → distinct → validate against schema.rs)
//!     → plugins read typed, validated slices
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new snapshot
//!     → source.rs publishes it
//!     → subscriptions re-emit only if their slice changed
//! ```
//!
//! # Design Decisions
//! - One schema per namespace for the process lifetime
//! - Every read is logged so unused config keys can be reported
//! - Raw config is untyped; typing happens at the schema boundary

pub mod env;
pub mod error;
pub mod loader;
pub mod path;
pub mod schema;
pub mod service;
pub mod snapshot;
pub mod source;
pub mod watcher;

pub use env::{Env, Mode, PackageInfo, ValidationContext};
pub use error::{ConfigError, FieldError, ValidationError};
pub use path::ConfigPath;
pub use schema::{AnySchema, FnSchema, Schema, SerdeSchema, Validate};
pub use service::{ConfigService, OptionalSubscription, Subscription};
pub use snapshot::Config;
pub use source::{ConfigSource, SnapshotSubscription};
