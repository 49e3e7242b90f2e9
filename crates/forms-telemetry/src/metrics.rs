//! Prometheus metrics for the forms signals core.
//!
//! All metrics follow the naming convention: `fm_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., versions_created_total)
//! - **Gauge**: Value that can go up or down (e.g., pending_revocations)
//! - **Histogram**: Distribution of values (e.g., flush_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DISPATCHER METRICS
    // =========================================================================

    /// Post-commit hooks that completed
    pub static ref HOOKS_FIRED: Counter = Counter::new(
        "fm_dispatch_hooks_fired_total",
        "Total post-commit hooks that completed successfully"
    ).expect("metric creation failed");

    /// Post-commit hook failures by handler
    pub static ref HOOK_FAILURES: CounterVec = CounterVec::new(
        Opts::new("fm_dispatch_hook_failures_total", "Post-commit hook failures"),
        &["handler"]
    ).expect("metric creation failed");

    /// Time spent draining the ready queue
    pub static ref FLUSH_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "fm_dispatch_flush_duration_seconds",
            "Time spent running post-commit hooks"
        ).buckets(exponential_buckets(0.0001, 2.0, 12).unwrap_or_default())
    ).expect("metric creation failed");

    // =========================================================================
    // VERSIONING METRICS
    // =========================================================================

    /// Form versions created (initial and explicit)
    pub static ref VERSIONS_CREATED: CounterVec = CounterVec::new(
        Opts::new("fm_versioning_versions_created_total", "Form versions created"),
        &["origin"]  // origin: initial/explicit/repair
    ).expect("metric creation failed");

    /// Pages created
    pub static ref PAGES_CREATED: Counter = Counter::new(
        "fm_versioning_pages_created_total",
        "Total pages created"
    ).expect("metric creation failed");

    // =========================================================================
    // CREDENTIAL METRICS
    // =========================================================================

    /// Tokens deleted by revocation
    pub static ref TOKENS_REVOKED: CounterVec = CounterVec::new(
        Opts::new("fm_credentials_tokens_revoked_total", "Tokens deleted by revocation"),
        &["kind"]  // kind: access/refresh
    ).expect("metric creation failed");

    /// Revocations that failed and were queued for retry
    pub static ref REVOCATION_FAILURES: Counter = Counter::new(
        "fm_credentials_revocation_failures_total",
        "Total failed revocation attempts"
    ).expect("metric creation failed");

    /// Accounts waiting for a revocation retry
    pub static ref PENDING_REVOCATIONS: Gauge = Gauge::new(
        "fm_credentials_pending_revocations",
        "Accounts whose revocation is queued for retry"
    ).expect("metric creation failed");

    // =========================================================================
    // CORRECTIVE TOOL METRICS
    // =========================================================================

    /// Entities fixed by corrective tools
    pub static ref REPAIRS: CounterVec = CounterVec::new(
        Opts::new("fm_repair_entities_fixed_total", "Entities fixed by corrective tools"),
        &["tool"]  // tool: versions/credentials
    ).expect("metric creation failed");
}

/// Handle proving the metrics are registered.
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle {
    registered: usize,
}

impl MetricsHandle {
    /// Number of collectors newly registered by this call.
    pub fn registered(&self) -> usize {
        self.registered
    }
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; collectors already present are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Dispatcher
        Box::new(HOOKS_FIRED.clone()),
        Box::new(HOOK_FAILURES.clone()),
        Box::new(FLUSH_DURATION.clone()),
        // Versioning
        Box::new(VERSIONS_CREATED.clone()),
        Box::new(PAGES_CREATED.clone()),
        // Credentials
        Box::new(TOKENS_REVOKED.clone()),
        Box::new(REVOCATION_FAILURES.clone()),
        Box::new(PENDING_REVOCATIONS.clone()),
        // Corrective tools
        Box::new(REPAIRS.clone()),
    ];

    let mut registered = 0;
    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) => registered += 1,
            Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { registered })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
