//! Capture timing metrics for package-manager transactions.
//!
//! The host package manager reports phase durations through its own
//! diagnostic stream as messages shaped `timer: <event>: <millisecs> ms`.
//! This crate intercepts that stream, folds the timer events together
//! with a snapshot of the transaction (package actions and sizes) and
//! the invoking process context (ancestry, argv) into a single record,
//! and persists one JSON file per invocation, pruning records past their
//! retention age on the way out.
//!
//! The host drives four hooks in order: [`PerfMetrics::new`] (or
//! [`PerfMetrics::with_context`]), [`PerfMetrics::configure`],
//! [`PerfMetrics::pre_transaction`] and
//! [`PerfMetrics::transaction_complete`]. Everything the host must
//! provide is defined in [`host`].

pub mod config;
pub mod host;
pub mod intercept;
pub mod plugin;
pub mod process_tree;
pub mod record;
pub mod retention;
pub mod snapshot;
pub mod timer;
pub mod writer;

pub use config::{ConfigError, MetricsConfig, DEFAULT_METRICS_DIR, DEFAULT_RETENTION_HOURS};
pub use host::{DiagnosticFilter, DiagnosticStream, LogLevel, TransactionMember};
pub use intercept::{MetricsFilter, SharedRecord};
pub use plugin::PerfMetrics;
pub use record::MetricsRecord;
pub use snapshot::{snapshot_members, PackageActionRecord};
pub use timer::{parse_timer_event, TimerEvent};
