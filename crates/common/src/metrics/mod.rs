//! Metrics for gateway traffic
//!
//! Descriptions and helpers over the `metrics` facade. The library installs
//! no exporter; a host application picks its own recorder.

use crate::gateway::Operation;
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Biblioteca metrics
pub const METRICS_PREFIX: &str = "biblioteca";

const REQUESTS_TOTAL: &str = "biblioteca_gateway_requests_total";
const REQUEST_DURATION: &str = "biblioteca_gateway_request_duration_seconds";
const SAVES_TOTAL: &str = "biblioteca_saves_total";
const DELETES_TOTAL: &str = "biblioteca_deletes_total";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        REQUESTS_TOTAL,
        Unit::Count,
        "Total number of backend requests by operation and outcome"
    );

    describe_histogram!(
        REQUEST_DURATION,
        Unit::Seconds,
        "Backend request latency in seconds"
    );

    describe_counter!(
        SAVES_TOTAL,
        Unit::Count,
        "Form saves by resource and terminal state"
    );

    describe_counter!(
        DELETES_TOTAL,
        Unit::Count,
        "Confirmed deletions by outcome"
    );

    tracing::debug!(prefix = METRICS_PREFIX, "Metrics registered");
}

/// Helper to record one backend request
pub struct RequestMetrics {
    start: Instant,
    operation: Operation,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(operation: Operation) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Record completion with an HTTP status
    pub fn finish(self, status: u16) {
        self.record(status.to_string());
    }

    /// Record a request that never got an answer
    pub fn finish_unreachable(self) {
        self.record("connection_error".to_string());
    }

    fn record(self, outcome: String) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            REQUESTS_TOTAL,
            "operation" => self.operation.as_str(),
            "outcome" => outcome
        )
        .increment(1);

        histogram!(
            REQUEST_DURATION,
            "operation" => self.operation.as_str()
        )
        .record(duration);
    }
}

/// Record the terminal state of a form save; only books reach `partial`
pub fn record_save(resource: &'static str, state: &'static str) {
    counter!(SAVES_TOTAL, "resource" => resource, "state" => state).increment(1);
}

/// Record a confirmed deletion
pub fn record_delete(resource: &'static str, success: bool) {
    let outcome = if success { "deleted" } else { "failed" };
    counter!(DELETES_TOTAL, "resource" => resource, "outcome" => outcome).increment(1);
}
