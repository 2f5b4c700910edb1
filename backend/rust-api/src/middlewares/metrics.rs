use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

/// Records request count and latency per method, route and status
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    // Execute the request
    let response = next.run(req).await;

    // Record metrics
    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    // Record request count
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    // Record request duration
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &path])
        .observe(duration);

    response
}

/// Collapses user and challenge ids into placeholders so label cardinality
/// stays bounded by the route table.
fn normalize_path(path: &str) -> String {
    let mut normalized = Vec::new();
    let mut previous = "";

    for segment in path.split('/') {
        // Ids follow their collection segment
        let replaced = match previous {
            "users" if !segment.is_empty() => "{user_id}",
            "challenges" if !segment.is_empty() => "{challenge_id}",
            _ => segment,
        };
        normalized.push(replaced);
        previous = segment;
    }

    normalized.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path("/api/v1/users/learner-42/profile"),
            "/api/v1/users/{user_id}/profile"
        );
        assert_eq!(
            normalize_path("/api/v1/users/u1/challenges/2026-10-17-earn_xp/claim"),
            "/api/v1/users/{user_id}/challenges/{challenge_id}/claim"
        );
        assert_eq!(
            normalize_path("/api/v1/users/u1/challenges"),
            "/api/v1/users/{user_id}/challenges"
        );
        assert_eq!(normalize_path("/api/v1/leaderboard"), "/api/v1/leaderboard");
        assert_eq!(normalize_path("/health"), "/health");
    }
}
