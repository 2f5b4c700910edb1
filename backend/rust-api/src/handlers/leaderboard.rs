use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use super::{validate_user_id, ApiError};
use crate::extractors::{AppJson, AppQuery};
use crate::models::{LeaderboardPage, LeaderboardQuery, LeaderboardType, SubmitScoreRequest};
use crate::services::AppState;

/// POST /api/v1/leaderboard/scores
pub async fn submit_score(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<SubmitScoreRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    validate_user_id(&req.user_id)?;

    let entry = state
        .leaderboard
        .submit_score(&req.user_id, req.score, req.achievements_count)
        .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/v1/leaderboard?type=&limit=&userId=
pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<LeaderboardQuery>,
) -> Result<Json<LeaderboardPage>, ApiError> {
    query.validate()?;

    let board = match query.board.as_deref() {
        None => LeaderboardType::Overall,
        Some(value) => LeaderboardType::parse(value).ok_or_else(|| {
            ApiError::bad_request(format!(
                "Unknown leaderboard type '{}', expected overall, weekly or monthly",
                value
            ))
        })?,
    };
    let limit = query
        .limit
        .unwrap_or(state.config.leaderboard.default_limit);

    let page = state
        .leaderboard
        .get_leaderboard(board, limit, query.user_id.as_deref())
        .await?;
    Ok(Json(page))
}
