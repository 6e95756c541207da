//! Prometheus-style metrics for generation runs.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()
}

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_SUBMITTED_TOTAL: &str = "veo_jobs_submitted_total";
    pub const JOBS_SUCCEEDED_TOTAL: &str = "veo_jobs_succeeded_total";
    pub const JOBS_FAILED_TOTAL: &str = "veo_jobs_failed_total";
    pub const POLL_TICKS_TOTAL: &str = "veo_poll_ticks_total";
    pub const RUNS_STARTED_TOTAL: &str = "veo_runs_started_total";
    pub const RUNS_FORCE_STOPPED_TOTAL: &str = "veo_runs_force_stopped_total";
    pub const LANES_ACTIVE: &str = "veo_lanes_active";
}

pub fn record_job_submitted(mode: &str) {
    counter!(names::JOBS_SUBMITTED_TOTAL, "mode" => mode.to_string()).increment(1);
}

pub fn record_job_succeeded(mode: &str) {
    counter!(names::JOBS_SUCCEEDED_TOTAL, "mode" => mode.to_string()).increment(1);
}

/// `kind` is one of `invalid_input`, `auth` or `provider`.
pub fn record_job_failed(mode: &str, kind: &'static str) {
    counter!(names::JOBS_FAILED_TOTAL, "mode" => mode.to_string(), "kind" => kind).increment(1);
}

pub fn record_poll_tick() {
    counter!(names::POLL_TICKS_TOTAL).increment(1);
}

pub fn record_run_started(plan: &'static str) {
    counter!(names::RUNS_STARTED_TOTAL, "plan" => plan).increment(1);
}

pub fn record_run_force_stopped() {
    counter!(names::RUNS_FORCE_STOPPED_TOTAL).increment(1);
}

pub fn record_lane_started() {
    gauge!(names::LANES_ACTIVE).increment(1.0);
}

pub fn record_lane_finished() {
    gauge!(names::LANES_ACTIVE).decrement(1.0);
}
