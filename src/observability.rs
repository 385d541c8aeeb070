use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: booking requests handled. Labels: outcome
/// (seated | reassigned | infeasible | contention | conflict).
pub const BOOKING_REQUESTS_TOTAL: &str = "maitre_booking_requests_total";

/// Histogram: end-to-end booking request latency in seconds.
pub const BOOKING_REQUEST_DURATION_SECONDS: &str = "maitre_booking_request_duration_seconds";

/// Histogram: candidates produced per assignment search.
pub const ASSIGNMENT_CANDIDATES: &str = "maitre_assignment_candidates";

// ── Contention / planner metrics ────────────────────────────────

/// Counter: lock acquisitions that timed out.
pub const LOCK_CONTENTION_TOTAL: &str = "maitre_lock_contention_total";

/// Counter: commit-time overlap conflicts (stale availability snapshot).
pub const COMMIT_CONFLICTS_TOTAL: &str = "maitre_commit_conflicts_total";

/// Counter: reassignment plans attempted. Labels: outcome (planned | failed).
pub const REASSIGN_ATTEMPTS_TOTAL: &str = "maitre_reassign_attempts_total";

/// Histogram: moves per successful reassignment plan.
pub const REASSIGN_MOVES: &str = "maitre_reassign_moves";

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

/// Console tracing for binaries and examples embedding the engine.
pub fn init_tracing() {
    tracing_subscriber::fmt::init();
}
