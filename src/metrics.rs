// src/metrics.rs
// Prometheus metrics: recorder installation and the /metrics render handler.
// All pipeline metrics are diagnostic only and never influence control flow.

use std::sync::OnceLock;

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::warn;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Safe to call once at startup; a failure
/// leaves the process without metrics but never prevents it from serving.
pub fn init_metrics() {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = HANDLE.set(handle);

            describe_counter!("sawt_turns_total", "Fully completed conversation turns");
            describe_counter!(
                "sawt_turns_aborted_total",
                "Turns aborted at a pipeline stage"
            );
            describe_counter!(
                "sawt_safety_detections_total",
                "Risk detections by pass and level"
            );
            describe_histogram!(
                "sawt_stage_duration_seconds",
                "Wall-clock duration per pipeline stage"
            );
        }
        Err(e) => warn!("Failed to install metrics recorder: {}", e),
    }
}

/// GET /metrics
pub async fn metrics_handler() -> String {
    HANDLE.get().map(|h| h.render()).unwrap_or_default()
}
