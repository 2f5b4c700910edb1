use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use super::{validate_user_id, ApiError};
use crate::extractors::AppJson;
use crate::models::{ChallengeProgressRequest, DailyChallengeInstance};
use crate::services::AppState;

/// GET /api/v1/users/{user_id}/challenges - Today's challenges, issued on demand
pub async fn list_todays_challenges(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<DailyChallengeInstance>>, ApiError> {
    validate_user_id(&user_id)?;

    let challenges = state.progression.todays_challenges(&user_id).await?;
    Ok(Json(challenges))
}

/// POST /api/v1/users/{user_id}/challenges/{challenge_id}/progress
pub async fn update_challenge_progress(
    State(state): State<Arc<AppState>>,
    Path((user_id, challenge_id)): Path<(String, String)>,
    AppJson(req): AppJson<ChallengeProgressRequest>,
) -> Result<Json<DailyChallengeInstance>, ApiError> {
    validate_user_id(&user_id)?;

    state
        .progression
        .update_challenge_progress(&user_id, &challenge_id, req.progress)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Challenge not found: {}", challenge_id)))
}

/// POST /api/v1/users/{user_id}/challenges/{challenge_id}/claim
///
/// Rejected claims are not errors: the body reports `claimed: false`.
pub async fn claim_challenge_reward(
    State(state): State<Arc<AppState>>,
    Path((user_id, challenge_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    validate_user_id(&user_id)?;

    let claimed = state
        .progression
        .claim_daily_challenge_reward(&user_id, &challenge_id)
        .await?;

    Ok(Json(json!({
        "challengeId": challenge_id,
        "claimed": claimed,
    })))
}
