//! Per-route request counters and latency histogram

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use copyvault_common::metrics::RequestMetrics;

/// Record method, matched route and status of every routed request
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let tracker = RequestMetrics::start(request.method().as_str(), &endpoint);
    let response = next.run(request).await;
    tracker.finish(response.status().as_u16());

    response
}
