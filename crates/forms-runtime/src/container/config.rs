//! # Runtime Configuration
//!
//! Defaults, overridden by environment variables, overridden by CLI flags.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FM_DATA_DIR` | `./data` | Directory of the persisted tables |
//! | `FM_PERSIST` | `true` | Persist to `FM_DATA_DIR`; otherwise in memory |
//! | `FM_FLUSH_ON_COMMIT` | `true` | Run ready hooks right after each write |
//! | `FM_LEDGER_RETENTION_SECS` | `3600` | Deduplication memory |
//! | `FM_FAILURE_LOG_CAPACITY` | `256` | Hook failures kept for `status` |

use forms_telemetry::{parse_flag, TelemetryConfig};
use shared_bus::DispatchConfig;
use std::path::PathBuf;
use thiserror::Error;

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub storage: StorageConfig,
    pub dispatch: DispatchConfig,
    /// Flush ready hooks after every primary write.
    pub flush_on_commit: bool,
    pub telemetry: TelemetryConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            dispatch: DispatchConfig::default(),
            flush_on_commit: true,
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Data directory for the table snapshot and its lock file.
    pub data_dir: PathBuf,
    /// Persist commits to `data_dir`; in memory otherwise.
    pub persist: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            persist: true,
        }
    }
}

impl StorageConfig {
    /// In-memory storage, used by tests and the demo.
    pub fn ephemeral() -> Self {
        Self {
            persist: false,
            ..Self::default()
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Data directory must not be empty when persistence is enabled")]
    EmptyDataDir,

    #[error("Failure log capacity must be at least 1")]
    ZeroFailureLogCapacity,

    #[error("Ledger GC interval must be at least 1 second")]
    ZeroGcInterval,
}

impl RuntimeConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|var| std::env::var(var).ok())?;
        config.telemetry = TelemetryConfig::from_env();
        Ok(config)
    }

    /// Defaults overridden by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(dir) = lookup("FM_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(persist) = lookup("FM_PERSIST") {
            config.storage.persist = parse_flag(&persist);
        }
        if let Some(flush) = lookup("FM_FLUSH_ON_COMMIT") {
            config.flush_on_commit = parse_flag(&flush);
        }
        if let Some(secs) = lookup("FM_LEDGER_RETENTION_SECS") {
            config.dispatch.ledger_retention_secs = parse_number("FM_LEDGER_RETENTION_SECS", secs)?;
        }
        if let Some(capacity) = lookup("FM_FAILURE_LOG_CAPACITY") {
            config.dispatch.failure_log_capacity =
                parse_number("FM_FAILURE_LOG_CAPACITY", capacity)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the runtime cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.persist && self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDataDir);
        }
        if self.dispatch.failure_log_capacity == 0 {
            return Err(ConfigError::ZeroFailureLogCapacity);
        }
        if self.dispatch.ledger_gc_interval_secs == 0 {
            return Err(ConfigError::ZeroGcInterval);
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { var, value })
}
