//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Install the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "sbgen_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "sbgen_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "sbgen_http_requests_in_flight";

    // Progress stream metrics
    pub const SSE_STREAMS_TOTAL: &str = "sbgen_sse_streams_total";
    pub const SSE_STREAMS_ACTIVE: &str = "sbgen_sse_streams_active";
    pub const SSE_EVENTS_SENT: &str = "sbgen_sse_events_sent_total";

    // Translation
    pub const TRANSLATIONS_TOTAL: &str = "sbgen_translations_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "sbgen_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a progress stream being opened.
pub fn record_stream_opened() {
    counter!(names::SSE_STREAMS_TOTAL).increment(1);
    gauge!(names::SSE_STREAMS_ACTIVE).increment(1.0);
}

/// Record a progress stream being closed.
pub fn record_stream_closed() {
    gauge!(names::SSE_STREAMS_ACTIVE).decrement(1.0);
}

/// Record one event written to a progress stream.
pub fn record_event_sent(event_type: &str) {
    let labels = [("type", event_type.to_string())];
    counter!(names::SSE_EVENTS_SENT, &labels).increment(1);
}

/// Record a storyboard translation request.
pub fn record_translation(target_language: &str) {
    let labels = [("target", target_language.to_string())];
    counter!(names::TRANSLATIONS_TOTAL, &labels).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

static UUID_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap()
});
static NUMERIC_SEGMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/[0-9]+(/|$)").unwrap());

/// Sanitize path for metrics labels (remove IDs, etc.).
fn sanitize_path(path: &str) -> String {
    let path = UUID_SEGMENT.replace_all(path, ":id");
    let path = NUMERIC_SEGMENT.replace_all(&path, "/:id$1");
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    // Streaming responses are timed to the first byte only.
    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/storyboard/550e8400-e29b-41d4-a716-446655440000"),
            "/api/storyboard/:id"
        );
        // Unmatched paths still get a bounded label.
        assert_eq!(sanitize_path("/api/storyboard/42"), "/api/storyboard/:id");
        assert_eq!(sanitize_path("/api/storyboard/42/frames"), "/api/storyboard/:id/frames");
        assert_eq!(sanitize_path("/api/storyboard/generate"), "/api/storyboard/generate");
    }
}
