//! Observability for the controller
//!
//! Provides:
//! - Prometheus metrics (pod events, skipped dispatches, actions, delete latency, watch errors)
//! - Structured lifecycle logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for delete latency (in seconds)
const DELETE_LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ControllerMetricsInner> = OnceLock::new();

struct ControllerMetricsInner {
    pod_events: IntCounter,
    dispatch_skipped: IntCounterVec,
    actions: IntCounterVec,
    delete_latency_seconds: Histogram,
    watch_errors: IntCounter,
}

impl ControllerMetricsInner {
    fn new() -> Self {
        Self {
            pod_events: register_int_counter!(
                "autoheal_pod_events_total",
                "Pod create/update events dispatched"
            )
            .expect("Failed to register pod_events"),

            dispatch_skipped: register_int_counter_vec!(
                "autoheal_dispatch_skipped_total",
                "Dispatches that ended without an action",
                &["reason"]
            )
            .expect("Failed to register dispatch_skipped"),

            actions: register_int_counter_vec!(
                "autoheal_actions_total",
                "Corrective actions attempted",
                &["reason", "outcome"]
            )
            .expect("Failed to register actions"),

            delete_latency_seconds: register_histogram!(
                "autoheal_delete_latency_seconds",
                "Time spent in the pod delete call",
                DELETE_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register delete_latency_seconds"),

            watch_errors: register_int_counter!(
                "autoheal_watch_errors_total",
                "Errors reported by the pod watch stream"
            )
            .expect("Failed to register watch_errors"),
        }
    }
}

/// Handle to the process-wide controller metrics.
///
/// Clones share the same underlying Prometheus collectors.
#[derive(Clone)]
pub struct ControllerMetrics {
    _private: (),
}

impl Default for ControllerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ControllerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ControllerMetricsInner {
        GLOBAL_METRICS.get_or_init(ControllerMetricsInner::new)
    }

    pub fn inc_pod_events(&self) {
        self.inner().pod_events.inc();
    }

    pub fn inc_skipped(&self, reason: &str) {
        self.inner().dispatch_skipped.with_label_values(&[reason]).inc();
    }

    pub fn inc_actions(&self, reason: &str, outcome: &str) {
        self.inner()
            .actions
            .with_label_values(&[reason, outcome])
            .inc();
    }

    pub fn observe_delete_latency(&self, duration_secs: f64) {
        self.inner().delete_latency_seconds.observe(duration_secs);
    }

    pub fn inc_watch_errors(&self) {
        self.inner().watch_errors.inc();
    }

    pub fn actions_total(&self, reason: &str, outcome: &str) -> u64 {
        self.inner()
            .actions
            .with_label_values(&[reason, outcome])
            .get()
    }
}

/// Structured logger for controller lifecycle events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, dry_run: bool) {
        info!(
            event = "controller_started",
            instance = %self.instance,
            version = %version,
            dry_run = dry_run,
            "Autoheal controller started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "controller_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Autoheal controller shutting down"
        );
    }

    /// The watcher (re)listed all pods; each listed pod is dispatched again
    pub fn log_watch_restarted(&self, pod_count: usize) {
        info!(
            event = "watch_restarted",
            instance = %self.instance,
            pods = pod_count,
            "Pod watch (re)listed cluster pods"
        );
    }

    pub fn log_watch_error(&self, error: &str) {
        warn!(
            event = "watch_error",
            instance = %self.instance,
            error = %error,
            "Pod watch error, retrying with backoff"
        );
    }
}
