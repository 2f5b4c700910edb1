use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Business Metrics
    pub static ref XP_AWARDED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "xp_awarded_total",
        "Total XP granted to learners",
        &["source"]
    )
    .unwrap();

    pub static ref LEVEL_UPS_TOTAL: IntCounter = register_int_counter!(
        "level_ups_total",
        "Total number of levels gained"
    )
    .unwrap();

    pub static ref ACHIEVEMENTS_UNLOCKED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "achievements_unlocked_total",
        "Total number of achievements unlocked",
        &["rarity"]
    )
    .unwrap();

    // Challenge & Leaderboard Metrics
    pub static ref CHALLENGE_CLAIMS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "challenge_claims_total",
        "Daily challenge reward claims",
        &["result"]
    )
    .unwrap();

    pub static ref LEADERBOARD_SUBMISSIONS_TOTAL: IntCounter = register_int_counter!(
        "leaderboard_submissions_total",
        "Total number of leaderboard score submissions"
    )
    .unwrap();

    pub static ref PROFILES_TOTAL: IntGauge = register_int_gauge!(
        "profiles_total",
        "Number of progression profiles created since start"
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    // Gather from the default registry
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Record a claim attempt; `claimed` is false for rejected claims
pub fn record_challenge_claim(claimed: bool) {
    let label = if claimed { "claimed" } else { "rejected" };
    CHALLENGE_CLAIMS_TOTAL.with_label_values(&[label]).inc();
}
