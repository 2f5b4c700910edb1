//! Static registry of achievement definitions.
//!
//! Ids are stable snake_case strings; profiles reference achievements by id
//! only, so renaming an id orphans existing unlocks.

use lazy_static::lazy_static;

use crate::models::{AchievementCategory, AchievementDefinition, Rarity, Requirement, RequirementKind};

pub const FIRST_MODULE: &str = "first_module";
pub const MODULE_EXPLORER: &str = "module_explorer";
pub const CURRICULUM_MASTER: &str = "curriculum_master";
pub const QUIZ_ROOKIE: &str = "quiz_rookie";
pub const QUIZ_WHIZ: &str = "quiz_whiz";
pub const PERFECTIONIST: &str = "perfectionist";
pub const FIRST_TRADE: &str = "first_trade";
pub const ACTIVE_TRADER: &str = "active_trader";
pub const PROFIT_TAKER: &str = "profit_taker";
pub const PORTFOLIO_BUILDER: &str = "portfolio_builder";
pub const WEEK_WARRIOR: &str = "week_warrior";
pub const MONTHLY_DEVOTEE: &str = "monthly_devotee";
pub const RISING_STAR: &str = "rising_star";
pub const MARKET_SCHOLAR: &str = "market_scholar";
pub const XP_COLLECTOR: &str = "xp_collector";

lazy_static! {
    static ref CATALOG: Vec<AchievementDefinition> = vec![
        define(
            FIRST_MODULE,
            "First Steps",
            "Complete your first learning module.",
            AchievementCategory::Learning,
            Rarity::Common,
            50,
            vec![Requirement::new(RequirementKind::ModulesCompleted, 1, "Complete 1 module")],
        ),
        define(
            MODULE_EXPLORER,
            "Module Explorer",
            "Complete 10 learning modules.",
            AchievementCategory::Learning,
            Rarity::Rare,
            150,
            vec![Requirement::new(RequirementKind::ModulesCompleted, 10, "Complete 10 modules")],
        ),
        define(
            CURRICULUM_MASTER,
            "Curriculum Master",
            "Complete 50 learning modules.",
            AchievementCategory::Learning,
            Rarity::Epic,
            500,
            vec![Requirement::new(RequirementKind::ModulesCompleted, 50, "Complete 50 modules")],
        ),
        define(
            QUIZ_ROOKIE,
            "Quiz Rookie",
            "Pass your first quiz.",
            AchievementCategory::Quiz,
            Rarity::Common,
            50,
            vec![Requirement::new(RequirementKind::QuizzesPassed, 1, "Pass 1 quiz")],
        ),
        define(
            QUIZ_WHIZ,
            "Quiz Whiz",
            "Pass 25 quizzes.",
            AchievementCategory::Quiz,
            Rarity::Rare,
            200,
            vec![Requirement::new(RequirementKind::QuizzesPassed, 25, "Pass 25 quizzes")],
        ),
        define(
            PERFECTIONIST,
            "Perfectionist",
            "Score 100% on 5 quizzes.",
            AchievementCategory::Quiz,
            Rarity::Epic,
            300,
            vec![Requirement::new(RequirementKind::PerfectQuizzes, 5, "Score 100% on 5 quizzes")],
        ),
        define(
            FIRST_TRADE,
            "First Trade",
            "Execute your first practice trade.",
            AchievementCategory::Trading,
            Rarity::Common,
            50,
            vec![Requirement::new(RequirementKind::TradesExecuted, 1, "Execute 1 trade")],
        ),
        define(
            ACTIVE_TRADER,
            "Active Trader",
            "Execute 50 practice trades.",
            AchievementCategory::Trading,
            Rarity::Rare,
            200,
            vec![Requirement::new(RequirementKind::TradesExecuted, 50, "Execute 50 trades")],
        ),
        define(
            PROFIT_TAKER,
            "Profit Taker",
            "Close 10 profitable trades.",
            AchievementCategory::Trading,
            Rarity::Epic,
            300,
            vec![Requirement::new(RequirementKind::ProfitableTrades, 10, "Close 10 profitable trades")],
        ),
        define(
            PORTFOLIO_BUILDER,
            "Portfolio Builder",
            "Grow your practice portfolio to 150,000.",
            AchievementCategory::Trading,
            Rarity::Legendary,
            1000,
            vec![Requirement::new(RequirementKind::PortfolioValue, 150_000, "Reach a portfolio value of 150,000")],
        ),
        define(
            WEEK_WARRIOR,
            "Week Warrior",
            "Learn seven days in a row.",
            AchievementCategory::Streak,
            Rarity::Rare,
            200,
            vec![Requirement::new(RequirementKind::LearningStreak, 7, "Keep a 7 day learning streak")],
        ),
        define(
            MONTHLY_DEVOTEE,
            "Monthly Devotee",
            "Learn thirty days in a row.",
            AchievementCategory::Streak,
            Rarity::Legendary,
            1000,
            vec![Requirement::new(RequirementKind::LearningStreak, 30, "Keep a 30 day learning streak")],
        ),
        define(
            RISING_STAR,
            "Rising Star",
            "Reach level 5.",
            AchievementCategory::Milestone,
            Rarity::Rare,
            250,
            vec![Requirement::new(RequirementKind::LevelReached, 5, "Reach level 5")],
        ),
        define(
            MARKET_SCHOLAR,
            "Market Scholar",
            "Complete 20 modules and pass 20 quizzes.",
            AchievementCategory::Milestone,
            Rarity::Epic,
            400,
            vec![
                Requirement::new(RequirementKind::ModulesCompleted, 20, "Complete 20 modules"),
                Requirement::new(RequirementKind::QuizzesPassed, 20, "Pass 20 quizzes"),
            ],
        ),
        define(
            XP_COLLECTOR,
            "XP Collector",
            "Earn 5,000 XP in total.",
            AchievementCategory::Milestone,
            Rarity::Epic,
            500,
            vec![Requirement::new(RequirementKind::TotalXp, 5000, "Earn 5,000 XP")],
        ),
    ];
}

fn define(
    id: &str,
    title: &str,
    description: &str,
    category: AchievementCategory,
    rarity: Rarity,
    xp_reward: u64,
    requirements: Vec<Requirement>,
) -> AchievementDefinition {
    AchievementDefinition {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        category,
        rarity,
        xp_reward,
        requirements,
    }
}

pub fn all() -> &'static [AchievementDefinition] {
    &CATALOG
}

pub fn find(id: &str) -> Option<&'static AchievementDefinition> {
    CATALOG.iter().find(|a| a.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<&str> = all().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids.len(), all().len());
    }

    #[test]
    fn test_every_definition_has_requirements() {
        for achievement in all() {
            assert!(!achievement.requirements.is_empty(), "{}", achievement.id);
            assert!(achievement.requirements.iter().all(|r| r.current == 0));
            assert!(achievement.requirements.iter().all(|r| r.target > 0));
        }
    }

    #[test]
    fn test_find() {
        assert_eq!(find(FIRST_MODULE).map(|a| a.xp_reward), Some(50));
        assert!(find("unknown").is_none());
    }
}
