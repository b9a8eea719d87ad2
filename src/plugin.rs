//! Plugin lifecycle: the four host hooks in order.
//!
//! construction → configure → pre_transaction → transaction_complete.
//! The record is seeded at construction, grows through the run, and is
//! persisted (root only) when the transaction finishes. Each invocation
//! is one short-lived process producing at most one record file.

use crate::config::{ConfigError, MetricsConfig};
use crate::host::{DiagnosticStream, LogLevel, TransactionMember};
use crate::intercept::{MetricsFilter, SharedRecord};
use crate::process_tree::process_tree;
use crate::record::MetricsRecord;
use crate::retention;
use crate::snapshot::snapshot_members;
use crate::writer;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

/// Performance-metrics plugin for one package-manager invocation.
pub struct PerfMetrics {
    record: SharedRecord,
    config: MetricsConfig,
    transaction_start: Option<Instant>,
}

impl PerfMetrics {
    /// Construct the plugin: seed process context into the record and
    /// attach the timer filter to the host's diagnostic stream.
    ///
    /// Called exactly once per process; the filter stays attached for
    /// the process's whole life.
    pub fn new(stream: &mut dyn DiagnosticStream) -> Self {
        Self::with_context(stream, std::env::args().collect(), process_tree())
    }

    /// Construct with explicit process context instead of reading it
    /// from the environment.
    pub fn with_context(
        stream: &mut dyn DiagnosticStream,
        command_args: Vec<String>,
        process_tree: Vec<String>,
    ) -> Self {
        let record: SharedRecord = Rc::new(RefCell::new(MetricsRecord::new()));
        {
            let mut record = record.borrow_mut();
            record.insert("process_tree", process_tree);
            record.insert("command_args", command_args);
        }

        // Timer messages surface at the host's finest level.
        stream.attach_filter(
            LogLevel::Trace,
            Box::new(MetricsFilter::new(Rc::clone(&record))),
        );

        Self {
            record,
            config: MetricsConfig::default(),
            transaction_start: None,
        }
    }

    /// Load plugin configuration.
    ///
    /// Malformed configuration is fatal; the host must abort the
    /// invocation before any transaction work.
    pub fn configure(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        self.config = MetricsConfig::load(config_path)?;
        tracing::debug!(
            metrics_dir = %self.config.metrics_dir.display(),
            retention_hours = self.config.retention_hours,
            "perfmetrics configured"
        );
        Ok(())
    }

    /// Snapshot the resolved transaction just before it executes and
    /// start the transaction clock.
    pub fn pre_transaction<'a>(
        &mut self,
        members: impl IntoIterator<Item = &'a dyn TransactionMember>,
    ) {
        let actions = snapshot_members(members);
        match serde_json::to_value(&actions) {
            Ok(value) => self.record.borrow_mut().insert("package_actions", value),
            Err(e) => tracing::error!(error = %e, "failed to serialize package actions"),
        }
        self.transaction_start = Some(Instant::now());
    }

    /// Finalize the record after the transaction ran, then persist it
    /// and prune old records. Both side effects happen only when running
    /// as root: only root can write the shared metrics directory, so a
    /// non-privileged run skips them without complaint.
    pub fn transaction_complete(&mut self) {
        self.finalize();
        self.persist(nix::unistd::geteuid().is_root());
    }

    /// Currently effective configuration.
    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Record the transaction duration. Without a start marker (the
    /// host never ran pre_transaction) the key is simply absent.
    fn finalize(&mut self) {
        if let Some(start) = self.transaction_start {
            let elapsed_ms = start.elapsed().as_millis() as u64;
            self.record
                .borrow_mut()
                .insert("full_transaction_time", elapsed_ms);
        }
    }

    fn persist(&self, privileged: bool) {
        if !privileged {
            tracing::debug!("not running as root, skipping metrics write and cleanup");
            return;
        }
        writer::write_record(&self.record.borrow(), &self.config.metrics_dir);
        retention::sweep_expired(&self.config.metrics_dir, self.config.retention_hours);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::DiagnosticFilter;
    use serde_json::{json, Value};
    use std::time::{Duration, SystemTime};

    fn init_logs() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    /// Minimal stand-in for the host's diagnostic dispatch.
    struct TestStream {
        filters: Vec<(LogLevel, Box<dyn DiagnosticFilter>)>,
    }

    impl TestStream {
        fn new() -> Self {
            Self {
                filters: Vec::new(),
            }
        }

        /// Deliver a message the way the host would: to every filter
        /// whose threshold admits the level, stopping at the first
        /// consumer. Returns whether some filter consumed it.
        fn dispatch(&mut self, level: LogLevel, message: &str) -> bool {
            for (threshold, filter) in self.filters.iter_mut() {
                if level <= *threshold && filter.filter(level, &message) {
                    return true;
                }
            }
            false
        }
    }

    impl DiagnosticStream for TestStream {
        fn attach_filter(&mut self, threshold: LogLevel, filter: Box<dyn DiagnosticFilter>) {
            self.filters.push((threshold, filter));
        }
    }

    struct TestMember {
        name: &'static str,
        action: &'static str,
    }

    impl TransactionMember for TestMember {
        fn name(&self) -> &str {
            self.name
        }
        fn arch(&self) -> &str {
            "noarch"
        }
        fn epoch(&self) -> &str {
            "0"
        }
        fn version(&self) -> &str {
            "2.1"
        }
        fn release(&self) -> &str {
            "3.fc41"
        }
        fn action(&self) -> &str {
            self.action
        }
        fn package_size(&self) -> u64 {
            10_000
        }
        fn install_size(&self) -> u64 {
            50_000
        }
    }

    fn test_plugin(stream: &mut TestStream) -> PerfMetrics {
        PerfMetrics::with_context(
            stream,
            vec!["dnf".to_string(), "install".to_string(), "bash".to_string()],
            vec![
                "systemd".to_string(),
                "sshd".to_string(),
                "bash".to_string(),
                "dnf".to_string(),
            ],
        )
    }

    #[test]
    fn test_construction_seeds_process_context() {
        let mut stream = TestStream::new();
        let plugin = test_plugin(&mut stream);

        let record = plugin.record.borrow();
        assert_eq!(
            record.get("process_tree"),
            Some(&json!(["systemd", "sshd", "bash", "dnf"]))
        );
        assert_eq!(record.get("command_args"), Some(&json!(["dnf", "install", "bash"])));
    }

    #[test]
    fn test_construction_attaches_one_trace_filter() {
        let mut stream = TestStream::new();
        let _plugin = test_plugin(&mut stream);

        assert_eq!(stream.filters.len(), 1);
        assert_eq!(stream.filters[0].0, LogLevel::Trace);
    }

    #[test]
    fn test_dispatched_timer_messages_are_captured_and_suppressed() {
        let mut stream = TestStream::new();
        let plugin = test_plugin(&mut stream);

        assert!(stream.dispatch(LogLevel::Trace, "timer: depsolve: 532 ms"));
        assert!(stream.dispatch(LogLevel::Debug, "Installing: bash-2.1-3.fc41"));
        assert!(stream.dispatch(LogLevel::Trace, "timer: rpm transaction: 12.9 ms"));

        let record = plugin.record.borrow();
        assert_eq!(record.get("depsolve_time"), Some(&json!(532)));
        assert_eq!(record.get("rpm_transaction_time"), Some(&json!(12)));
        // Seeded context plus the two timers; the install line left no trace.
        assert_eq!(record.len(), 4);
    }

    #[test]
    fn test_repeated_timer_keeps_last_value() {
        let mut stream = TestStream::new();
        let plugin = test_plugin(&mut stream);

        stream.dispatch(LogLevel::Trace, "timer: depsolve: 100 ms");
        stream.dispatch(LogLevel::Trace, "timer: depsolve: 900 ms");

        assert_eq!(plugin.record.borrow().get("depsolve_time"), Some(&json!(900)));
    }

    #[test]
    fn test_configure_missing_file_uses_defaults() {
        let mut stream = TestStream::new();
        let mut plugin = test_plugin(&mut stream);

        plugin
            .configure(Path::new("/nonexistent/perfmetrics.toml"))
            .unwrap();
        assert_eq!(plugin.config().retention_hours, 4);
    }

    #[test]
    fn test_configure_malformed_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("perfmetrics.toml");
        std::fs::write(&config_path, "retention_hours = \"abc\"\n").unwrap();

        let mut stream = TestStream::new();
        let mut plugin = test_plugin(&mut stream);

        assert!(plugin.configure(&config_path).is_err());
    }

    #[test]
    fn test_pre_transaction_snapshots_in_order() {
        let mut stream = TestStream::new();
        let mut plugin = test_plugin(&mut stream);

        let members = [
            TestMember {
                name: "bash",
                action: "upgrade",
            },
            TestMember {
                name: "oldpkg",
                action: "remove",
            },
        ];
        plugin.pre_transaction(members.iter().map(|m| m as &dyn TransactionMember));

        let record = plugin.record.borrow();
        let actions = record.get("package_actions").unwrap();
        assert_eq!(actions[0]["name"], "bash");
        assert_eq!(actions[0]["action"], "upgrade");
        assert_eq!(actions[1]["name"], "oldpkg");
        assert_eq!(actions[1]["action"], "remove");
        assert!(plugin.transaction_start.is_some());
    }

    #[test]
    fn test_finalize_records_transaction_duration() {
        let mut stream = TestStream::new();
        let mut plugin = test_plugin(&mut stream);

        plugin.pre_transaction(std::iter::empty());
        std::thread::sleep(Duration::from_millis(20));
        plugin.finalize();

        let record = plugin.record.borrow();
        let elapsed = record.get("full_transaction_time").unwrap().as_u64().unwrap();
        assert!(elapsed >= 10, "elapsed was {elapsed} ms");
        assert!(elapsed < 10_000);
    }

    #[test]
    fn test_finalize_without_pre_transaction_omits_duration() {
        let mut stream = TestStream::new();
        let mut plugin = test_plugin(&mut stream);

        plugin.finalize();
        assert_eq!(plugin.record.borrow().get("full_transaction_time"), None);
    }

    #[test]
    fn test_unprivileged_persist_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let metrics_dir = dir.path().join("metrics");

        let mut stream = TestStream::new();
        let mut plugin = test_plugin(&mut stream);
        plugin.config = MetricsConfig {
            metrics_dir: metrics_dir.clone(),
            retention_hours: 4,
        };
        stream.dispatch(LogLevel::Trace, "timer: depsolve: 532 ms");
        plugin.pre_transaction(std::iter::empty());
        plugin.finalize();

        plugin.persist(false);
        assert!(!metrics_dir.exists());
    }

    #[test]
    fn test_privileged_lifecycle_writes_record_and_sweeps() {
        init_logs();
        let dir = tempfile::tempdir().unwrap();
        let metrics_dir = dir.path().join("metrics");
        std::fs::create_dir_all(&metrics_dir).unwrap();

        // One record from a previous invocation, well past retention.
        let stale = metrics_dir.join("perfmetrics-1000000000.000000_1.json");
        std::fs::write(&stale, "{}\n").unwrap();
        let old_mtime = SystemTime::now()
            .checked_sub(Duration::from_secs(5 * 3600))
            .unwrap();
        filetime::set_file_mtime(&stale, filetime::FileTime::from_system_time(old_mtime)).unwrap();

        let config_path = dir.path().join("perfmetrics.toml");
        std::fs::write(
            &config_path,
            format!(
                "metrics_dir = \"{}\"\nretention_hours = 4\n",
                metrics_dir.display()
            ),
        )
        .unwrap();

        let mut stream = TestStream::new();
        let mut plugin = test_plugin(&mut stream);
        plugin.configure(&config_path).unwrap();

        stream.dispatch(LogLevel::Trace, "timer: depsolve: 532 ms");
        let members = [TestMember {
            name: "bash",
            action: "install",
        }];
        plugin.pre_transaction(members.iter().map(|m| m as &dyn TransactionMember));
        stream.dispatch(LogLevel::Trace, "timer: rpm transaction: 41 ms");
        plugin.finalize();
        plugin.persist(true);

        assert!(!stale.exists(), "expired record should be swept");

        let written: Vec<_> = std::fs::read_dir(&metrics_dir)
            .unwrap()
            .flatten()
            .map(|e| e.path())
            .collect();
        assert_eq!(written.len(), 1);

        let contents = std::fs::read_to_string(&written[0]).unwrap();
        let parsed: Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed["depsolve_time"], 532);
        assert_eq!(parsed["rpm_transaction_time"], 41);
        assert_eq!(parsed["command_args"], json!(["dnf", "install", "bash"]));
        assert_eq!(
            parsed["process_tree"],
            json!(["systemd", "sshd", "bash", "dnf"])
        );
        assert_eq!(parsed["package_actions"][0]["name"], "bash");
        assert!(parsed["full_transaction_time"].is_u64());
    }

    #[test]
    fn test_late_messages_after_finalize_still_captured() {
        let mut stream = TestStream::new();
        let mut plugin = test_plugin(&mut stream);

        plugin.pre_transaction(std::iter::empty());
        plugin.finalize();
        assert!(stream.dispatch(LogLevel::Trace, "timer: verify: 3 ms"));
        assert_eq!(plugin.record.borrow().get("verify_time"), Some(&json!(3)));
    }
}
