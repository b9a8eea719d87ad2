//! Diagnostic-stream interception.
//!
//! The host reports timing through its ordinary diagnostic stream rather
//! than a dedicated channel, so the capture point is a log filter: every
//! message is matched against the timer grammar, hits land in the shared
//! record, and nothing at this level, matched or not, is allowed through
//! to other sinks.

use crate::host::{DiagnosticFilter, LogLevel};
use crate::record::MetricsRecord;
use crate::timer::parse_timer_event;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared handle to the record mutated by both the filter and the
/// lifecycle hooks. The hooks run strictly sequentially on one thread,
/// so a `RefCell` is all the coordination needed.
pub type SharedRecord = Rc<RefCell<MetricsRecord>>;

/// Log filter that diverts timer events into the metrics record.
///
/// Installed once at plugin construction and never detached; it runs on
/// every diagnostic message the host emits, so the per-message work is
/// one regex match and at most one map insert.
pub struct MetricsFilter {
    record: SharedRecord,
}

impl MetricsFilter {
    pub fn new(record: SharedRecord) -> Self {
        Self { record }
    }
}

impl DiagnosticFilter for MetricsFilter {
    fn filter(&mut self, _level: LogLevel, message: &dyn fmt::Display) -> bool {
        if let Some(event) = parse_timer_event(&message.to_string()) {
            self.record.borrow_mut().insert(event.key, event.millis);
        }
        // Consume the message either way; timer noise never reaches the logs.
        true
    }
}
