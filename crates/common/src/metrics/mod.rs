//! Metrics and observability utilities
//!
//! Prometheus metrics with SLO-aligned request histograms and
//! per-domain counters for copies, likes, challenges and EcoVerse play.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all CopyVault metrics
pub const METRICS_PREFIX: &str = "copyvault";

/// SLO-aligned histogram buckets for request latency (in seconds)
/// Targets: P50 < 50ms, P99 < 150ms
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms - P50 target
    0.075,  // 75ms
    0.100,  // 100ms
    0.150,  // 150ms - P99 target
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Copy metrics
    describe_counter!(
        format!("{}_copies_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total copies created"
    );

    describe_counter!(
        format!("{}_copy_views_total", METRICS_PREFIX),
        Unit::Count,
        "Total copy views recorded"
    );

    describe_counter!(
        format!("{}_likes_toggled_total", METRICS_PREFIX),
        Unit::Count,
        "Total like toggles, labelled by resulting state"
    );

    // Challenge metrics
    describe_counter!(
        format!("{}_challenge_submissions_total", METRICS_PREFIX),
        Unit::Count,
        "Total challenge submissions"
    );

    // EcoVerse metrics
    describe_counter!(
        format!("{}_quiz_submissions_total", METRICS_PREFIX),
        Unit::Count,
        "Total graded quiz submissions"
    );

    describe_counter!(
        format!("{}_eco_actions_total", METRICS_PREFIX),
        Unit::Count,
        "Total EcoVerse actions applied"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

pub fn record_copy_created(category: &str) {
    counter!(
        format!("{}_copies_created_total", METRICS_PREFIX),
        "category" => category.to_string()
    )
    .increment(1);
}

pub fn record_copy_view() {
    counter!(format!("{}_copy_views_total", METRICS_PREFIX)).increment(1);
}

/// Helper to record a like toggle
pub fn record_like_toggle(liked: bool) {
    let direction = if liked { "like" } else { "unlike" };

    counter!(
        format!("{}_likes_toggled_total", METRICS_PREFIX),
        "direction" => direction
    )
    .increment(1);
}

pub fn record_challenge_submission() {
    counter!(format!("{}_challenge_submissions_total", METRICS_PREFIX)).increment(1);
}

/// Helper to record a graded quiz
pub fn record_quiz_submission(quiz_id: &str, correct: usize) {
    counter!(
        format!("{}_quiz_submissions_total", METRICS_PREFIX),
        "quiz" => quiz_id.to_string(),
        "scored" => if correct > 0 { "true" } else { "false" }
    )
    .increment(1);
}

/// Helper to record an applied EcoVerse action
pub fn record_eco_action(kind: &str) {
    counter!(
        format!("{}_eco_actions_total", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets() {
        // Verify buckets are sorted and contain SLO targets
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }

        assert!(LATENCY_BUCKETS.contains(&0.050));
        assert!(LATENCY_BUCKETS.contains(&0.150));
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed: every helper is a no-op
        let metrics = RequestMetrics::start("GET", "/v1/copies");
        metrics.finish(200);
        record_like_toggle(true);
        record_eco_action("quick");
    }
}
