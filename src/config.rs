use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default directory collectors expect to find metrics records in.
pub const DEFAULT_METRICS_DIR: &str = "/var/log/dnf/perfmetrics";

/// Default record age limit, in hours, before the retention sweep
/// deletes it.
pub const DEFAULT_RETENTION_HOURS: u64 = 4;

/// Plugin configuration loaded from a TOML config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub metrics_dir: PathBuf,
    pub retention_hours: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            metrics_dir: PathBuf::from(DEFAULT_METRICS_DIR),
            retention_hours: DEFAULT_RETENTION_HOURS,
        }
    }
}

impl MetricsConfig {
    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults, as does a present file with
    /// missing keys. A file that exists but cannot be read or parsed, or
    /// that sets `retention_hours` to anything other than a positive
    /// integer, is a fatal configuration error: the invocation must fail
    /// here, before any transaction work begins.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        if config.retention_hours == 0 {
            return Err(ConfigError::ZeroRetention {
                path: path.to_path_buf(),
            });
        }

        Ok(config)
    }
}

/// Errors raised while loading the plugin configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The config file is not valid TOML, or a value has the wrong type.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// `retention_hours` must be a positive integer.
    ZeroRetention { path: PathBuf },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config file {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config file {}: {}", path.display(), source)
            }
            ConfigError::ZeroRetention { path } => {
                write!(
                    f,
                    "retention_hours in {} must be a positive integer",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::ZeroRetention { .. } => None,
        }
    }
}
