use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::profile::ProgressCategory;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum XpSource {
    Progress { category: ProgressCategory },
    Achievement { achievement_id: String },
    Challenge { challenge_id: String },
    /// One event per grant covering every level crossed
    LevelUpBonus { from_level: u32, to_level: u32 },
}

impl XpSource {
    /// Metric label
    pub fn label(&self) -> &'static str {
        match self {
            XpSource::Progress { .. } => "progress",
            XpSource::Achievement { .. } => "achievement",
            XpSource::Challenge { .. } => "challenge",
            XpSource::LevelUpBonus { .. } => "level_up_bonus",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpEvent {
    pub id: String,
    pub user_id: String,
    pub amount: u64,
    pub source: XpSource,
    pub created_at: DateTime<Utc>,
}
