//! Age-based cleanup of persisted metrics records.
//!
//! Each invocation writes one record and then prunes the directory, so
//! storage stays bounded without any external scheduler. Several
//! invocations may sweep the same directory at once; losing a race to a
//! sibling is not an error.

use std::io::ErrorKind;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Delete every entry in `metrics_dir` whose mtime is more than
/// `retention_hours` old.
pub fn sweep_expired(metrics_dir: &Path, retention_hours: u64) {
    sweep_expired_at(metrics_dir, retention_hours, SystemTime::now());
}

/// Sweep against an explicit "now", so the age boundary is testable.
///
/// A file exactly at the age limit is retained (strict inequality).
/// Entries that vanish or lose their metadata between listing and
/// deletion are skipped; removal failures other than NotFound are logged
/// and do not stop the sweep.
fn sweep_expired_at(metrics_dir: &Path, retention_hours: u64, now: SystemTime) {
    let age_limit = Duration::from_secs(retention_hours.saturating_mul(3600));
    let cutoff = match now.checked_sub(age_limit) {
        Some(t) => t,
        None => return,
    };

    let entries = match std::fs::read_dir(metrics_dir) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(
                error = %e,
                dir = %metrics_dir.display(),
                "failed to read metrics directory for retention sweep"
            );
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        // A sibling sweeper may have taken the file since the listing.
        let mtime = match entry.metadata().and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(_) => continue,
        };
        if mtime < cutoff {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!(file = %path.display(), "removed expired metrics record");
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        file = %path.display(),
                        "failed to remove expired metrics record"
                    );
                }
            }
        }
    }
}
