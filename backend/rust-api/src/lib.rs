use axum::{
    http::{header, HeaderName, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{ProgressionError, ProgressionResult};
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(middlewares::trace::TRACE_ID_HEADER),
        ])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler).layer(middleware::from_fn_with_state(
                app_state.clone(),
                handlers::metrics_auth_middleware,
            )),
        )
        .nest("/api/v1", api_routes().layer(cors))
        .with_state(app_state)
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/achievements", get(handlers::progression::list_catalog))
        .nest("/users/{user_id}", user_routes())
        .route("/leaderboard", get(handlers::leaderboard::get_leaderboard))
        .route(
            "/leaderboard/scores",
            post(handlers::leaderboard::submit_score),
        )
}

fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", get(handlers::progression::get_profile))
        .route("/progress", post(handlers::progression::update_progress))
        .route(
            "/achievements",
            get(handlers::progression::get_achievement_progress),
        )
        .route(
            "/achievements/check",
            post(handlers::progression::check_achievements),
        )
        .route("/xp-events", get(handlers::progression::list_xp_events))
        .route("/reset", post(handlers::progression::reset_progress))
        .route(
            "/challenges",
            get(handlers::challenges::list_todays_challenges),
        )
        .route(
            "/challenges/{challenge_id}/progress",
            post(handlers::challenges::update_challenge_progress),
        )
        .route(
            "/challenges/{challenge_id}/claim",
            post(handlers::challenges::claim_challenge_reward),
        )
}
