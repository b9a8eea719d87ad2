//! Boundary traits for the host package manager.
//!
//! The plugin never owns the host's diagnostic dispatch or transaction
//! machinery; it sees them only through these traits. The host
//! implements them, the plugin consumes them, and tests substitute
//! small fakes.

use std::fmt;

/// Severity of a host diagnostic message, ordered coarse to fine.
///
/// `Trace` is the level the host's own timer instrumentation emits at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
    Trace,
}

/// A filter attached to the host's diagnostic stream.
pub trait DiagnosticFilter {
    /// Inspect one diagnostic message.
    ///
    /// Returning `true` marks the message consumed: the host must not
    /// deliver it to any further sink. Message values are not guaranteed
    /// to be plain strings, so they arrive as `Display`.
    fn filter(&mut self, level: LogLevel, message: &dyn fmt::Display) -> bool;
}

/// Registration point on the host's diagnostic dispatch.
pub trait DiagnosticStream {
    /// Attach a filter that receives every message at `threshold` or
    /// coarser, synchronously, in emission order.
    fn attach_filter(&mut self, threshold: LogLevel, filter: Box<dyn DiagnosticFilter>);
}

/// One resolved member of the pending transaction.
///
/// The host guarantees package metadata (both sizes) is present even for
/// removals.
pub trait TransactionMember {
    fn name(&self) -> &str;
    fn arch(&self) -> &str;
    fn epoch(&self) -> &str;
    fn version(&self) -> &str;
    fn release(&self) -> &str;
    /// Short action tag, e.g. "install", "upgrade", "remove", "downgrade".
    fn action(&self) -> &str;
    /// Size of the package payload in bytes.
    fn package_size(&self) -> u64;
    /// Installed footprint in bytes.
    fn install_size(&self) -> u64;
}
