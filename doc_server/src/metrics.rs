//! Prometheus metrics for processor observability.

use metrics::{counter, gauge, histogram};

/// Initialize metrics exporter (Prometheus).
pub fn init_metrics() {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    if let Err(e) = builder.install() {
        tracing::warn!("Failed to install Prometheus exporter: {}", e);
    }
}

/// Record an uploaded file by kind (docx/pdf).
pub fn upload_received(kind: &str) {
    counter!("docproc_uploads_received_total", "kind" => kind.to_string()).increment(1);
}

/// Record a job state transition.
pub fn job_status_changed(status: &str) {
    counter!("docproc_jobs_total", "status" => status.to_string()).increment(1);
}

/// Record whole-job duration.
pub fn job_duration(duration_ms: u64) {
    histogram!("docproc_job_duration_ms").record(duration_ms as f64);
}

/// Record per-file step duration.
pub fn step_duration(action: &str, duration_ms: u64) {
    histogram!("docproc_step_duration_ms", "action" => action.to_string()).record(duration_ms as f64);
}

/// Set current in-flight job count.
pub fn jobs_active(count: usize) {
    gauge!("docproc_jobs_active").set(count as f64);
}
