//! Timer-event extraction from host diagnostic text.
//!
//! The host's instrumentation reports phase durations as ordinary log
//! messages shaped `timer: <event>: <millisecs> ms`. This module
//! recognizes exactly that shape and nothing else; anything that doesn't
//! match is simply not a timer event.

use regex::Regex;
use std::sync::LazyLock;

/// Matches the full text of a host timer message.
static TIMER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^timer: (?P<event>.*): (?P<millisecs>[0-9.]+) ms$").unwrap());

/// A named duration extracted from one diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerEvent {
    /// Record key: event name with spaces replaced by underscores, plus
    /// a `_time` suffix. Case is preserved.
    pub key: String,
    /// Duration in milliseconds, truncated toward zero.
    pub millis: u64,
}

/// Parse one diagnostic message into a timer event.
///
/// Returns `None` for anything that does not match the timer grammar,
/// including numeric text with more than one decimal point or no digits
/// at all. Never panics, whatever the input looks like.
pub fn parse_timer_event(message: &str) -> Option<TimerEvent> {
    let caps = TIMER_PATTERN.captures(message)?;
    let event = caps.name("event")?.as_str();
    let millis = truncate_millis(caps.name("millisecs")?.as_str())?;
    let key = format!("{}_time", event.replace(' ', "_"));
    Some(TimerEvent { key, millis })
}

/// Truncate the matched numeric text toward zero.
///
/// The pattern admits any run of digits and dots; only "digits with at
/// most one decimal point" is a number. "12.7" truncates to 12, ".5" to 0.
fn truncate_millis(raw: &str) -> Option<u64> {
    if raw.matches('.').count() > 1 || !raw.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    let whole = raw.split('.').next().unwrap_or("");
    if whole.is_empty() {
        return Some(0);
    }
    whole.parse().ok()
}
