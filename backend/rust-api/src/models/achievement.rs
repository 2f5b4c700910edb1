use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog template for an achievement. Definitions returned from an
/// evaluation carry the user's computed `current` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDefinition {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: AchievementCategory,
    pub rarity: Rarity,
    pub xp_reward: u64,
    pub requirements: Vec<Requirement>,
}

impl AchievementDefinition {
    pub fn is_satisfied(&self) -> bool {
        self.requirements.iter().all(Requirement::is_met)
    }

    /// Average completion across requirements, 0..=100
    pub fn progress_percent(&self) -> u8 {
        if self.requirements.is_empty() {
            return 0;
        }

        let total: u64 = self
            .requirements
            .iter()
            .map(Requirement::percent)
            .map(u64::from)
            .sum();
        (total / self.requirements.len() as u64) as u8
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(rename = "type")]
    pub kind: RequirementKind,
    pub target: u64,
    pub current: u64,
    pub description: String,
}

impl Requirement {
    pub fn new(kind: RequirementKind, target: u64, description: &str) -> Self {
        Self {
            kind,
            target,
            current: 0,
            description: description.to_string(),
        }
    }

    pub fn is_met(&self) -> bool {
        self.current >= self.target
    }

    pub fn percent(&self) -> u8 {
        if self.target == 0 || self.is_met() {
            return 100;
        }
        ((self.current.saturating_mul(100)) / self.target) as u8
    }
}

/// One variant per requirement type; see `services::rule_evaluator` for how
/// each kind computes its `current` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    ModulesCompleted,
    QuizzesPassed,
    PerfectQuizzes,
    TradesExecuted,
    ProfitableTrades,
    PortfolioValue,
    LearningStreak,
    LevelReached,
    TotalXp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Learning,
    Quiz,
    Trading,
    Streak,
    Milestone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }
}

/// Closed set of user actions that can trigger achievement checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    ModuleComplete,
    QuizComplete,
    TradeExecute,
    PortfolioUpdate,
    DailyLogin,
}

impl ActionType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "module_complete" => Some(ActionType::ModuleComplete),
            "quiz_complete" => Some(ActionType::QuizComplete),
            "trade_execute" => Some(ActionType::TradeExecute),
            "portfolio_update" => Some(ActionType::PortfolioUpdate),
            "daily_login" => Some(ActionType::DailyLogin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::ModuleComplete => "module_complete",
            ActionType::QuizComplete => "quiz_complete",
            ActionType::TradeExecute => "trade_execute",
            ActionType::PortfolioUpdate => "portfolio_update",
            ActionType::DailyLogin => "daily_login",
        }
    }
}

/// Optional action details. Unknown fields are ignored and a payload that
/// does not parse is treated as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPayload {
    pub count: Option<u64>,
    pub score: Option<u64>,
    pub profit: Option<f64>,
    pub value: Option<f64>,
}

impl ActionPayload {
    pub fn from_json(value: Option<serde_json::Value>) -> Self {
        value
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }
}

/// Catalog entry with one user's progress towards it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementProgress {
    pub achievement: AchievementDefinition,
    pub progress: u8,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_requirement_percent_caps_at_100() {
        let mut req = Requirement::new(RequirementKind::ModulesCompleted, 4, "Complete 4 modules");
        req.current = 1;
        assert_eq!(req.percent(), 25);
        req.current = 9;
        assert_eq!(req.percent(), 100);
        assert!(req.is_met());
    }

    #[test]
    fn test_requirement_serializes_type_tag() {
        let req = Requirement::new(RequirementKind::LearningStreak, 7, "Keep a 7 day streak");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["type"], "learning_streak");
        assert_eq!(value["target"], 7);
        assert_eq!(value["current"], 0);
    }

    #[test]
    fn test_action_type_parse_rejects_unknown() {
        assert_eq!(
            ActionType::parse("module_complete"),
            Some(ActionType::ModuleComplete)
        );
        assert_eq!(ActionType::parse("nonexistent_action"), None);
    }

    #[test]
    fn test_payload_is_lenient() {
        let payload = ActionPayload::from_json(Some(json!({"score": 100, "extra": true})));
        assert_eq!(payload.score, Some(100));

        let garbage = ActionPayload::from_json(Some(json!("not an object")));
        assert_eq!(garbage, ActionPayload::default());
    }
}
