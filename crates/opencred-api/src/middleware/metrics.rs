//! # Prometheus Metrics
//!
//! HTTP-level metrics (request counts, latency, errors) are recorded in
//! middleware. Domain-level gauges (credentials by status, institutions
//! by verification state, shares, verification log size) are updated on
//! each `/metrics` scrape (pull model) — see the metrics handler in
//! `lib.rs`.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{
    core::Collector, Encoder, GaugeVec, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,

    // -- HTTP middleware metrics (push model) --
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_errors_total: IntCounterVec,

    // -- Domain gauges (pull model, updated on /metrics scrape) --
    credentials_total: GaugeVec,
    institutions_total: GaugeVec,
    shares_total: GaugeVec,
    verifications_total: prometheus::Gauge,
    audit_log_entries_total: prometheus::Gauge,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &self.requests())
            .field("errors", &self.errors())
            .finish()
    }
}

impl ApiMetrics {
    /// Create a new metrics instance with a fresh Prometheus registry.
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("opencred_http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let http_request_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "opencred_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "path"],
        )
        .expect("metric can be created");

        let http_errors_total = IntCounterVec::new(
            Opts::new(
                "opencred_http_errors_total",
                "Total HTTP errors (4xx and 5xx)",
            ),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let credentials_total = GaugeVec::new(
            Opts::new("opencred_credentials_total", "Total credentials by status"),
            &["status"],
        )
        .expect("metric can be created");

        let institutions_total = GaugeVec::new(
            Opts::new(
                "opencred_institutions_total",
                "Total institutions by verification state",
            ),
            &["verified"],
        )
        .expect("metric can be created");

        let shares_total = GaugeVec::new(
            Opts::new("opencred_shares_total", "Total credential shares by state"),
            &["active"],
        )
        .expect("metric can be created");

        let verifications_total = prometheus::Gauge::new(
            "opencred_verifications_total",
            "Total verification log entries",
        )
        .expect("metric can be created");

        let audit_log_entries_total = prometheus::Gauge::new(
            "opencred_audit_log_entries_total",
            "Total audit log entries",
        )
        .expect("metric can be created");

        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(http_errors_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(credentials_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(institutions_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(shares_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(verifications_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(audit_log_entries_total.clone()))
            .expect("metric can be registered");

        Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                http_errors_total,
                credentials_total,
                institutions_total,
                shares_total,
                verifications_total,
                audit_log_entries_total,
            }),
        }
    }

    /// Current total request count (sum across all labels).
    pub fn requests(&self) -> u64 {
        let mut total = 0u64;
        for mf in &self.inner.http_requests_total.collect() {
            for m in mf.get_metric() {
                total += m.get_counter().get_value() as u64;
            }
        }
        total
    }

    /// Current total error count (sum across all labels).
    pub fn errors(&self) -> u64 {
        let mut total = 0u64;
        for mf in &self.inner.http_errors_total.collect() {
            for m in mf.get_metric() {
                total += m.get_counter().get_value() as u64;
            }
        }
        total
    }

    /// Record an HTTP request (called by the middleware).
    fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();

        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);

        if status >= 400 {
            self.inner
                .http_errors_total
                .with_label_values(&[method, path, &status_str])
                .inc();
        }
    }

    // -- Domain gauge accessors (used by the /metrics handler) --

    /// Credentials-by-status gauge.
    pub fn credentials_total(&self) -> &GaugeVec {
        &self.inner.credentials_total
    }

    /// Institutions-by-verification gauge.
    pub fn institutions_total(&self) -> &GaugeVec {
        &self.inner.institutions_total
    }

    /// Shares-by-state gauge.
    pub fn shares_total(&self) -> &GaugeVec {
        &self.inner.shares_total
    }

    /// Verification log size gauge.
    pub fn verifications_total(&self) -> &prometheus::Gauge {
        &self.inner.verifications_total
    }

    /// Audit log size gauge.
    pub fn audit_log_entries_total(&self) -> &prometheus::Gauge {
        &self.inner.audit_log_entries_total
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer)
            .map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a request path by replacing identifier segments.
///
/// Prevents cardinality explosion in Prometheus labels: UUID segments
/// become `{id}` and 64-hex share-token segments become `{token}`.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.len() == 36
                && segment.chars().enumerate().all(|(i, c)| {
                    if i == 8 || i == 13 || i == 18 || i == 23 {
                        c == '-'
                    } else {
                        c.is_ascii_hexdigit()
                    }
                })
            {
                "{id}"
            } else if segment.len() == 64 && segment.chars().all(|c| c.is_ascii_hexdigit()) {
                "{token}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Middleware that records HTTP request metrics via Prometheus.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        let duration = start.elapsed().as_secs_f64();
        let status = response.status().as_u16();
        m.record_request(&method, &path, status, duration);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_metrics_new_starts_at_zero() {
        let m = ApiMetrics::new();
        assert_eq!(m.requests(), 0);
        assert_eq!(m.errors(), 0);
    }

    #[test]
    fn requests_and_errors_increment() {
        let m = ApiMetrics::new();
        m.record_request("POST", "/v1/credentials/issue", 201, 0.01);
        m.record_request("POST", "/v1/credentials/verify", 200, 0.005);
        m.record_request("POST", "/v1/credentials/revoke", 403, 0.002);
        assert_eq!(m.requests(), 3);
        assert_eq!(m.errors(), 1);
    }

    #[test]
    fn clone_shares_underlying_counters() {
        let m = ApiMetrics::new();
        let clone = m.clone();
        m.record_request("GET", "/v1/credentials/history", 200, 0.01);
        assert_eq!(clone.requests(), 1);
    }

    #[test]
    fn gather_and_encode_produces_text() {
        let m = ApiMetrics::new();
        m.record_request("GET", "/test", 200, 0.01);
        let output = m.gather_and_encode().unwrap();
        assert!(output.contains("opencred_http_requests_total"));
        assert!(output.contains("opencred_http_request_duration_seconds"));
    }

    #[test]
    fn normalize_path_replaces_uuid() {
        let path = "/v1/institutions/550e8400-e29b-41d4-a716-446655440000/verify";
        assert_eq!(normalize_path(path), "/v1/institutions/{id}/verify");
    }

    #[test]
    fn normalize_path_replaces_share_token() {
        let path = format!("/v1/shares/{}", "a".repeat(64));
        assert_eq!(normalize_path(&path), "/v1/shares/{token}");
    }

    #[test]
    fn normalize_path_preserves_static_segments() {
        assert_eq!(
            normalize_path("/v1/credentials/history"),
            "/v1/credentials/history"
        );
    }

    #[test]
    fn domain_gauges_update() {
        let m = ApiMetrics::new();
        m.credentials_total().with_label_values(&["active"]).set(2.0);
        m.verifications_total().set(7.0);
        let output = m.gather_and_encode().unwrap();
        assert!(output.contains("opencred_credentials_total"));
        assert!(output.contains("opencred_verifications_total"));
    }
}
