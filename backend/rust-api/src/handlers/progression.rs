use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use super::{validate_user_id, ApiError};
use crate::extractors::{AppJson, AppQuery};
use crate::models::{
    AchievementCheckRequest, AchievementProgress, ProgressUpdateRequest, UserProgressionProfile,
    XpEvent, XpEventsQuery,
};
use crate::services::{achievement_catalog, AppState};

/// GET /api/v1/achievements - Full catalog
pub async fn list_catalog() -> impl IntoResponse {
    Json(achievement_catalog::all().to_vec())
}

/// GET /api/v1/users/{user_id}/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProgressionProfile>, ApiError> {
    validate_user_id(&user_id)?;

    let profile = state.progression.get_user_profile(&user_id).await?;
    Ok(Json(profile))
}

/// POST /api/v1/users/{user_id}/progress
///
/// Unknown categories are accepted and ignored; `applied` tells the caller.
pub async fn update_progress(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    AppJson(req): AppJson<ProgressUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_user_id(&user_id)?;
    req.validate()?;

    tracing::info!(
        "Progress update for user_id={}, category={}, amount={}",
        user_id,
        req.category,
        req.amount
    );

    let applied = state
        .progression
        .update_progress(&user_id, &req.category, req.amount)
        .await?;

    let profile = if applied {
        Some(state.progression.get_user_profile(&user_id).await?)
    } else {
        None
    };

    Ok(Json(json!({
        "applied": applied,
        "profile": profile,
    })))
}

/// POST /api/v1/users/{user_id}/achievements/check
pub async fn check_achievements(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    AppJson(req): AppJson<AchievementCheckRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_user_id(&user_id)?;
    req.validate()?;

    let unlocked = state
        .progression
        .check_achievements(&user_id, &req.action_type, req.payload)
        .await?;

    Ok(Json(json!({ "unlocked": unlocked })))
}

/// GET /api/v1/users/{user_id}/achievements
pub async fn get_achievement_progress(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<AchievementProgress>>, ApiError> {
    validate_user_id(&user_id)?;

    let progress = state.progression.achievement_progress(&user_id).await?;
    Ok(Json(progress))
}

/// GET /api/v1/users/{user_id}/xp-events
pub async fn list_xp_events(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    AppQuery(query): AppQuery<XpEventsQuery>,
) -> Result<Json<Vec<XpEvent>>, ApiError> {
    validate_user_id(&user_id)?;

    let max = state.config.progression.xp_event_limit;
    let limit = query.limit.unwrap_or(max).min(max);
    let events = state.progression.xp_events(&user_id, limit).await?;
    Ok(Json(events))
}

/// POST /api/v1/users/{user_id}/reset
pub async fn reset_progress(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProgressionProfile>, ApiError> {
    validate_user_id(&user_id)?;

    let profile = state.progression.reset_progress(&user_id).await?;
    Ok(Json(profile))
}
