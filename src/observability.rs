use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: bookings successfully created.
pub const BOOKINGS_CREATED_TOTAL: &str = "huddle_bookings_created_total";

/// Counter: booking candidates rejected by the scheduling policy.
pub const BOOKING_CONFLICTS_TOTAL: &str = "huddle_booking_conflicts_total";

/// Counter: health/ping requests recorded.
pub const REQUESTS_RECORDED_TOTAL: &str = "huddle_requests_recorded_total";

/// Counter: rejected admin-endpoint authentications.
pub const AUTH_FAILURES_TOTAL: &str = "huddle_auth_failures_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Histogram: journal group-commit flush duration in seconds.
pub const JOURNAL_FLUSH_DURATION_SECONDS: &str = "huddle_journal_flush_duration_seconds";

/// Histogram: journal group-commit batch size (events per flush).
pub const JOURNAL_FLUSH_BATCH_SIZE: &str = "huddle_journal_flush_batch_size";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
