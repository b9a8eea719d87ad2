//! Persist the finished record to the metrics directory.

use crate::record::MetricsRecord;
use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};

/// Write `record` to a uniquely named JSON file under `metrics_dir`,
/// creating the directory (and parents) first if needed.
///
/// The filename is `perfmetrics-<unix-time>_<pid>.json`; the fractional
/// timestamp plus pid keeps concurrent invocations from colliding within
/// the retention window. Failures are logged with the offending path and
/// swallowed: a metrics write must never break the transaction that
/// produced it. Returns the written path on success.
pub fn write_record(record: &MetricsRecord, metrics_dir: &Path) -> Option<PathBuf> {
    if let Err(e) = std::fs::create_dir_all(metrics_dir) {
        tracing::error!(
            error = %e,
            dir = %metrics_dir.display(),
            "failed to create metrics directory"
        );
        return None;
    }

    let now = Utc::now();
    let filename = format!(
        "perfmetrics-{}.{:06}_{}.json",
        now.timestamp(),
        now.timestamp_subsec_micros(),
        std::process::id()
    );
    let path = metrics_dir.join(filename);

    match write_json(record, &path) {
        Ok(()) => {
            tracing::debug!(file = %path.display(), "wrote performance metrics");
            Some(path)
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                file = %path.display(),
                "failed to write performance metrics"
            );
            None
        }
    }
}

/// Serialize and write one record: pretty-printed, trailing newline.
fn write_json(record: &MetricsRecord, path: &Path) -> io::Result<()> {
    let mut json = record.to_pretty_json().map_err(io::Error::from)?;
    json.push('\n');
    std::fs::write(path, json)
}
