use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardType {
    Overall,
    Weekly,
    Monthly,
}

impl LeaderboardType {
    pub const ALL: [LeaderboardType; 3] = [
        LeaderboardType::Overall,
        LeaderboardType::Weekly,
        LeaderboardType::Monthly,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "overall" => Some(LeaderboardType::Overall),
            "weekly" => Some(LeaderboardType::Weekly),
            "monthly" => Some(LeaderboardType::Monthly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardType::Overall => "overall",
            LeaderboardType::Weekly => "weekly",
            LeaderboardType::Monthly => "monthly",
        }
    }
}

/// Stored score submission, one per user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub user_id: String,
    pub score: u64,
    pub level: u32,
    pub achievements: u32,
    pub submitted_at: DateTime<Utc>,
}

/// Ranked row of a leaderboard snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub score: u64,
    pub level: u32,
    /// 1-based, assigned by the ranker
    pub rank: u32,
    /// Positive when the user moved up since the previous snapshot
    pub change: i64,
    pub achievements: u32,
}

impl From<&ScoreRecord> for LeaderboardEntry {
    fn from(record: &ScoreRecord) -> Self {
        LeaderboardEntry {
            user_id: record.user_id.clone(),
            score: record.score,
            level: record.level,
            rank: 0,
            change: 0,
            achievements: record.achievements,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardPage {
    #[serde(rename = "type")]
    pub board: LeaderboardType,
    pub entries: Vec<LeaderboardEntry>,
    pub current_user_rank: Option<u32>,
    /// Size of the full board, independent of `limit`
    pub total: usize,
}
