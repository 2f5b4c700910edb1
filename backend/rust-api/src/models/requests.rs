use serde::Deserialize;
use validator::Validate;

use crate::services::progression_service::MAX_PROGRESS_AMOUNT;

/// POST /api/v1/users/{user_id}/progress
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdateRequest {
    #[validate(length(min = 1, max = 32, message = "Category must be between 1 and 32 characters"))]
    pub category: String,

    #[validate(range(max = MAX_PROGRESS_AMOUNT, message = "Amount must be at most 1000000"))]
    pub amount: u64,
}

/// POST /api/v1/users/{user_id}/achievements/check
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AchievementCheckRequest {
    #[validate(length(
        min = 1,
        max = 64,
        message = "Action type must be between 1 and 64 characters"
    ))]
    pub action_type: String,

    /// Free-form action details (count, score, profit, value)
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ChallengeProgressRequest {
    pub progress: u64,
}

/// POST /api/v1/leaderboard/scores
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreRequest {
    #[validate(length(
        min = 1,
        max = 128,
        message = "User id must be between 1 and 128 characters"
    ))]
    pub user_id: String,

    pub score: u64,

    #[serde(default)]
    pub achievements_count: u32,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardQuery {
    #[serde(rename = "type")]
    pub board: Option<String>,

    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<usize>,

    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct XpEventsQuery {
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_progress_request_rejects_empty_category() {
        let req: ProgressUpdateRequest =
            serde_json::from_value(json!({"category": "", "amount": 10})).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_achievement_check_payload_is_optional() {
        let req: AchievementCheckRequest =
            serde_json::from_value(json!({"actionType": "daily_login"})).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.payload.is_none());
    }

    #[test]
    fn test_submit_score_defaults_achievements() {
        let req: SubmitScoreRequest =
            serde_json::from_value(json!({"userId": "u1", "score": 1500})).unwrap();
        assert_eq!(req.achievements_count, 0);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_leaderboard_limit_bounds() {
        let query = LeaderboardQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert!(query.validate().is_err());

        let query = LeaderboardQuery {
            limit: Some(25),
            ..Default::default()
        };
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_progress_request_caps_amount() {
        let req: ProgressUpdateRequest =
            serde_json::from_value(json!({"category": "trading", "amount": 1_000_001})).unwrap();
        assert!(req.validate().is_err());

        let req: ProgressUpdateRequest =
            serde_json::from_value(json!({"category": "trading", "amount": 1_000_000})).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_negative_amount_does_not_deserialize() {
        let result: Result<ProgressUpdateRequest, _> =
            serde_json::from_value(json!({"category": "learning", "amount": -5}));
        assert!(result.is_err());
    }
}
