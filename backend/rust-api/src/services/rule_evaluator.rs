use chrono::NaiveDate;

use super::achievement_catalog;
use crate::models::{
    AchievementDefinition, ActionPayload, ActionType, ChallengeType, RequirementKind, StreakKind,
    UserProgressionProfile,
};

/// A parsed user action
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEvent {
    pub action: ActionType,
    pub payload: ActionPayload,
}

impl ActionEvent {
    pub fn new(action: ActionType, payload: ActionPayload) -> Self {
        Self { action, payload }
    }

    /// `None` for action types outside the known set
    pub fn parse(action_type: &str, payload: Option<serde_json::Value>) -> Option<Self> {
        ActionType::parse(action_type).map(|action| Self::new(action, ActionPayload::from_json(payload)))
    }
}

impl RequirementKind {
    pub fn is_relevant_to(&self, action: ActionType) -> bool {
        match self {
            RequirementKind::ModulesCompleted => action == ActionType::ModuleComplete,
            RequirementKind::QuizzesPassed | RequirementKind::PerfectQuizzes => {
                action == ActionType::QuizComplete
            }
            RequirementKind::TradesExecuted | RequirementKind::ProfitableTrades => {
                action == ActionType::TradeExecute
            }
            RequirementKind::PortfolioValue => action == ActionType::PortfolioUpdate,
            RequirementKind::LearningStreak => matches!(
                action,
                ActionType::ModuleComplete | ActionType::QuizComplete
            ),
            // Derived from XP, which any action may have moved
            RequirementKind::LevelReached | RequirementKind::TotalXp => true,
        }
    }

    pub fn current(
        &self,
        profile: &UserProgressionProfile,
        payload: &ActionPayload,
        today: NaiveDate,
    ) -> u64 {
        let stats = &profile.stats;
        match self {
            RequirementKind::ModulesCompleted => stats.modules_completed,
            RequirementKind::QuizzesPassed => stats.quizzes_passed,
            RequirementKind::PerfectQuizzes => stats.perfect_quizzes,
            RequirementKind::TradesExecuted => stats.trades_executed,
            RequirementKind::ProfitableTrades => stats.profitable_trades,
            RequirementKind::PortfolioValue => {
                let reported = payload.value.unwrap_or(0.0);
                stats.best_portfolio_value.max(reported).max(0.0).floor() as u64
            }
            RequirementKind::LearningStreak => {
                profile.current_streak(StreakKind::DailyLearning, today) as u64
            }
            RequirementKind::LevelReached => profile.level as u64,
            RequirementKind::TotalXp => profile.xp,
        }
    }
}

/// Maps user actions onto profile counters and decides which catalog
/// achievements they satisfy.
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    passing_quiz_score: u64,
}

impl RuleEvaluator {
    pub fn new(passing_quiz_score: u64) -> Self {
        Self { passing_quiz_score }
    }

    /// Applies the action to the profile's counters and streaks.
    ///
    /// Returns the daily challenge progress the action contributes, as
    /// `(challenge type, delta)` pairs.
    pub fn record_action(
        &self,
        profile: &mut UserProgressionProfile,
        event: &ActionEvent,
        today: NaiveDate,
    ) -> Vec<(ChallengeType, u64)> {
        let payload = &event.payload;
        let mut contributions = Vec::new();
        let mut learning_activity = false;

        match event.action {
            ActionType::ModuleComplete => {
                let count = payload.count.unwrap_or(1);
                if count > 0 {
                    profile.stats.modules_completed =
                        profile.stats.modules_completed.saturating_add(count);
                    contributions.push((ChallengeType::CompleteModules, count));
                    learning_activity = true;
                }
            }
            ActionType::QuizComplete => {
                let passed = payload
                    .score
                    .is_none_or(|score| score >= self.passing_quiz_score);
                if passed {
                    profile.stats.quizzes_passed += 1;
                    contributions.push((ChallengeType::PassQuizzes, 1));
                }
                if payload.score == Some(100) {
                    profile.stats.perfect_quizzes += 1;
                }
                learning_activity = true;
            }
            ActionType::TradeExecute => {
                profile.stats.trades_executed += 1;
                if payload.profit.is_some_and(|profit| profit > 0.0) {
                    profile.stats.profitable_trades += 1;
                }
                contributions.push((ChallengeType::ExecuteTrades, 1));
            }
            ActionType::PortfolioUpdate => {
                if let Some(value) = payload.value.filter(|v| v.is_finite()) {
                    profile.stats.best_portfolio_value =
                        profile.stats.best_portfolio_value.max(value);
                }
            }
            ActionType::DailyLogin => {
                if profile.touch_streak(StreakKind::DailyLogin, today) {
                    profile.stats.login_days += 1;
                }
            }
        }

        if learning_activity {
            profile.touch_streak(StreakKind::DailyLearning, today);
            contributions.push((ChallengeType::MaintainStreak, 1));
        }

        contributions
    }

    /// Fills each requirement's `current` for this profile.
    pub fn evaluate(
        &self,
        definition: &AchievementDefinition,
        profile: &UserProgressionProfile,
        payload: &ActionPayload,
        today: NaiveDate,
    ) -> AchievementDefinition {
        let mut evaluated = definition.clone();
        for requirement in &mut evaluated.requirements {
            requirement.current = requirement.kind.current(profile, payload, today);
        }
        evaluated
    }

    /// Catalog achievements touched by `event` that the profile has not yet
    /// unlocked and now fully satisfies, in catalog order.
    pub fn newly_satisfied(
        &self,
        profile: &UserProgressionProfile,
        event: &ActionEvent,
        today: NaiveDate,
    ) -> Vec<AchievementDefinition> {
        achievement_catalog::all()
            .iter()
            .filter(|definition| !profile.has_achievement(&definition.id))
            .filter(|definition| {
                definition
                    .requirements
                    .iter()
                    .any(|r| r.kind.is_relevant_to(event.action))
            })
            .map(|definition| self.evaluate(definition, profile, &event.payload, today))
            .filter(AchievementDefinition::is_satisfied)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::achievement_catalog::{
        FIRST_MODULE, FIRST_TRADE, MARKET_SCHOLAR, PERFECTIONIST, PORTFOLIO_BUILDER, QUIZ_ROOKIE,
    };
    use chrono::Utc;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn profile() -> UserProgressionProfile {
        UserProgressionProfile::new("learner", 100, Utc::now())
    }

    fn ids(defs: &[AchievementDefinition]) -> Vec<&str> {
        defs.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_module_complete_unlocks_first_module() {
        let evaluator = RuleEvaluator::new(70);
        let mut p = profile();
        let event = ActionEvent::parse("module_complete", None).unwrap();

        evaluator.record_action(&mut p, &event, today());
        let unlocked = evaluator.newly_satisfied(&p, &event, today());

        assert_eq!(ids(&unlocked), vec![FIRST_MODULE]);
        assert_eq!(unlocked[0].requirements[0].current, 1);
    }

    #[test]
    fn test_already_unlocked_is_skipped() {
        let evaluator = RuleEvaluator::new(70);
        let mut p = profile();
        p.stats.modules_completed = 1;
        p.achievements.push(crate::models::UnlockedAchievement {
            achievement_id: FIRST_MODULE.to_string(),
            unlocked_at: Utc::now(),
            progress: 100,
        });
        let event = ActionEvent::parse("module_complete", None).unwrap();

        assert!(evaluator.newly_satisfied(&p, &event, today()).is_empty());
    }

    #[test]
    fn test_quiz_scores() {
        let evaluator = RuleEvaluator::new(70);
        let mut p = profile();

        let failed = ActionEvent::parse("quiz_complete", Some(json!({"score": 40}))).unwrap();
        evaluator.record_action(&mut p, &failed, today());
        assert_eq!(p.stats.quizzes_passed, 0);
        assert!(evaluator.newly_satisfied(&p, &failed, today()).is_empty());

        let perfect = ActionEvent::parse("quiz_complete", Some(json!({"score": 100}))).unwrap();
        let contributions = evaluator.record_action(&mut p, &perfect, today());
        assert_eq!(p.stats.quizzes_passed, 1);
        assert_eq!(p.stats.perfect_quizzes, 1);
        assert!(contributions.contains(&(ChallengeType::PassQuizzes, 1)));
        assert!(ids(&evaluator.newly_satisfied(&p, &perfect, today())).contains(&QUIZ_ROOKIE));
        assert!(!ids(&evaluator.newly_satisfied(&p, &perfect, today())).contains(&PERFECTIONIST));
    }

    #[test]
    fn test_requirements_are_scoped_to_action() {
        let evaluator = RuleEvaluator::new(70);
        let mut p = profile();
        p.stats.trades_executed = 3;

        // Trades already satisfy FIRST_TRADE, but a module action does not check it
        let event = ActionEvent::parse("module_complete", Some(json!({"count": 0}))).unwrap();
        evaluator.record_action(&mut p, &event, today());
        assert!(!ids(&evaluator.newly_satisfied(&p, &event, today())).contains(&FIRST_TRADE));
    }

    #[test]
    fn test_portfolio_value_uses_payload() {
        let evaluator = RuleEvaluator::new(70);
        let p = profile();
        let event =
            ActionEvent::parse("portfolio_update", Some(json!({"value": 150000.5}))).unwrap();

        assert_eq!(ids(&evaluator.newly_satisfied(&p, &event, today())), vec![PORTFOLIO_BUILDER]);
    }

    #[test]
    fn test_multi_requirement_needs_all() {
        let evaluator = RuleEvaluator::new(70);
        let mut p = profile();
        p.stats.modules_completed = 25;
        p.stats.quizzes_passed = 19;
        let event = ActionEvent::parse("quiz_complete", Some(json!({"score": 80}))).unwrap();

        let scholar = achievement_catalog::find(MARKET_SCHOLAR).unwrap();
        assert!(!evaluator.evaluate(scholar, &p, &event.payload, today()).is_satisfied());

        evaluator.record_action(&mut p, &event, today());
        assert!(ids(&evaluator.newly_satisfied(&p, &event, today())).contains(&MARKET_SCHOLAR));
    }

    #[test]
    fn test_daily_login_counts_once_per_day() {
        let evaluator = RuleEvaluator::new(70);
        let mut p = profile();
        let event = ActionEvent::parse("daily_login", None).unwrap();

        evaluator.record_action(&mut p, &event, today());
        evaluator.record_action(&mut p, &event, today());
        assert_eq!(p.stats.login_days, 1);
        assert_eq!(p.current_streak(StreakKind::DailyLogin, today()), 1);
    }

    #[test]
    fn test_lapsed_learning_streak_counts_as_zero() {
        let evaluator = RuleEvaluator::new(70);
        let mut p = profile();
        let event = ActionEvent::parse("module_complete", None).unwrap();
        evaluator.record_action(&mut p, &event, today());

        let streak = RequirementKind::LearningStreak;
        let payload = ActionPayload::default();
        assert_eq!(streak.current(&p, &payload, today()), 1);
        assert_eq!(streak.current(&p, &payload, today().succ_opt().unwrap()), 1);
        let later = today() + chrono::Duration::days(3);
        assert_eq!(streak.current(&p, &payload, later), 0);
    }

    #[test]
    fn test_unknown_action_does_not_parse() {
        assert!(ActionEvent::parse("nonexistent_action", Some(json!({}))).is_none());
    }
}
