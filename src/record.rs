//! The in-memory record accumulated over one invocation.

use serde_json::{Map, Value};

/// Mutable mapping from metric key to JSON value, built up across the
/// plugin lifecycle and serialized exactly once at the end.
///
/// Keys are unique: inserting an existing key overwrites the previous
/// value, so a timer event reported twice keeps only its final duration.
#[derive(Debug, Clone, Default)]
pub struct MetricsRecord {
    entries: Map<String, Value>,
}

impl MetricsRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite one metric.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Pretty-printed JSON with two-space indentation, no trailing newline.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }
}
