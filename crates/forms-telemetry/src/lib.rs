//! # Forms Telemetry
//!
//! Structured logging and Prometheus metrics for the forms signals core.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` registry with an `EnvFilter`, pretty
//!   or JSON console output and an optional JSON log file
//! - **Metrics**: Prometheus counters for hooks, versions, revocations and
//!   corrective tools
//!
//! ## Usage
//!
//! ```rust,ignore
//! use forms_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FM_SERVICE_NAME` | `forms-signals` | Service name in startup logs |
//! | `FM_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` wins) |
//! | `FM_CONSOLE_OUTPUT` | `true` | Log to stderr |
//! | `FM_JSON_LOGS` | `false` | JSON console output |
//! | `FM_LOG_FILE` | unset | Append JSON log lines to this file |

mod config;
pub mod metrics;
mod tracing_setup;

pub use config::{parse_flag, TelemetryConfig};
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, MetricsHandle, FLUSH_DURATION, HOOKS_FIRED,
    HOOK_FAILURES, PAGES_CREATED, PENDING_REVOCATIONS, REPAIRS, REVOCATION_FAILURES,
    TOKENS_REVOKED, VERSIONS_CREATED,
};
pub use tracing_setup::{build_filter, init_tracing, TracingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to open log file: {0}")]
    LogFile(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    let tracing_guard = init_tracing(config)?;

    Ok(TelemetryGuard {
        _tracing: tracing_guard,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for adding to a counter.
#[macro_export]
macro_rules! metric_add {
    ($metric:expr, $value:expr) => {
        $metric.inc_by($value as f64)
    };
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).inc_by($value as f64)
    };
}
