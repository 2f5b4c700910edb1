use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::challenge::DailyChallengeInstance;

/// Aggregate root for one learner's progression.
///
/// `level` and `xp_to_next_level` are derived from `xp` and are refreshed by
/// the progression service after every XP change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgressionProfile {
    pub user_id: String,
    pub level: u32,
    pub xp: u64,
    pub xp_to_next_level: u64,
    pub total_points: u64,
    pub achievements: Vec<UnlockedAchievement>,
    pub streaks: Vec<Streak>,
    pub daily_challenges: Vec<DailyChallengeInstance>,
    pub leaderboard_position: Option<u32>,
    pub stats: LearningStats,
    pub category_xp: CategoryXp,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProgressionProfile {
    pub fn new(user_id: &str, xp_to_next_level: u64, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            level: 1,
            xp: 0,
            xp_to_next_level,
            total_points: 0,
            achievements: Vec::new(),
            streaks: Vec::new(),
            daily_challenges: Vec::new(),
            leaderboard_position: None,
            stats: LearningStats::default(),
            category_xp: CategoryXp::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_achievement(&self, achievement_id: &str) -> bool {
        self.achievements
            .iter()
            .any(|a| a.achievement_id == achievement_id)
    }

    pub fn streak(&self, kind: StreakKind) -> Option<&Streak> {
        self.streaks.iter().find(|s| s.kind == kind)
    }

    /// Live streak length as of `today`; lapsed streaks report 0
    pub fn current_streak(&self, kind: StreakKind, today: NaiveDate) -> u32 {
        self.streak(kind).map(|s| s.current_on(today)).unwrap_or(0)
    }

    /// Zeroes `current` on streaks that lapsed before `today`
    pub fn expire_streaks(&mut self, today: NaiveDate) {
        for streak in &mut self.streaks {
            streak.current = streak.current_on(today);
        }
    }

    /// Records activity on `day` for the given streak, creating it on first use.
    /// Returns true when the streak counter changed.
    pub fn touch_streak(&mut self, kind: StreakKind, day: NaiveDate) -> bool {
        if let Some(streak) = self.streaks.iter_mut().find(|s| s.kind == kind) {
            return streak.record(day);
        }

        let mut streak = Streak::new(kind);
        streak.record(day);
        self.streaks.push(streak);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockedAchievement {
    pub achievement_id: String,
    pub unlocked_at: DateTime<Utc>,
    /// Percentage, always 100 once unlocked
    pub progress: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakKind {
    DailyLearning,
    DailyLogin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    pub kind: StreakKind,
    pub current: u32,
    pub longest: u32,
    pub last_activity: Option<NaiveDate>,
}

impl Streak {
    pub fn new(kind: StreakKind) -> Self {
        Self {
            kind,
            current: 0,
            longest: 0,
            last_activity: None,
        }
    }

    /// `current` while the last activity was today or yesterday, else 0
    pub fn current_on(&self, today: NaiveDate) -> u32 {
        match self.last_activity {
            Some(last) if today.pred_opt().is_some_and(|yesterday| last >= yesterday) => {
                self.current
            }
            _ => 0,
        }
    }

    /// Same day is a no-op, the next day extends, any gap restarts at 1.
    pub fn record(&mut self, day: NaiveDate) -> bool {
        match self.last_activity {
            Some(last) if last >= day => return false,
            Some(last) if last.succ_opt() == Some(day) => self.current += 1,
            _ => self.current = 1,
        }

        self.last_activity = Some(day);
        self.longest = self.longest.max(self.current);
        true
    }
}

/// Per-activity counters that achievement requirements are computed from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStats {
    pub modules_completed: u64,
    pub quizzes_passed: u64,
    pub perfect_quizzes: u64,
    pub trades_executed: u64,
    pub profitable_trades: u64,
    pub best_portfolio_value: f64,
    pub login_days: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryXp {
    pub learning: u64,
    pub trading: u64,
    pub quiz: u64,
    pub social: u64,
}

impl CategoryXp {
    pub fn add(&mut self, category: ProgressCategory, amount: u64) {
        let slot = match category {
            ProgressCategory::Learning => &mut self.learning,
            ProgressCategory::Trading => &mut self.trading,
            ProgressCategory::Quiz => &mut self.quiz,
            ProgressCategory::Social => &mut self.social,
        };
        *slot = slot.saturating_add(amount);
    }
}

/// Categories accepted by `update_progress`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressCategory {
    Learning,
    Trading,
    Quiz,
    Social,
}

impl ProgressCategory {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "learning" => Some(ProgressCategory::Learning),
            "trading" => Some(ProgressCategory::Trading),
            "quiz" => Some(ProgressCategory::Quiz),
            "social" => Some(ProgressCategory::Social),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressCategory::Learning => "learning",
            ProgressCategory::Trading => "trading",
            ProgressCategory::Quiz => "quiz",
            ProgressCategory::Social => "social",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_streak_extends_on_consecutive_days() {
        let mut streak = Streak::new(StreakKind::DailyLearning);
        assert!(streak.record(day(1)));
        assert!(streak.record(day(2)));
        assert!(streak.record(day(3)));
        assert_eq!(streak.current, 3);
        assert_eq!(streak.longest, 3);
    }

    #[test]
    fn test_streak_same_day_is_noop() {
        let mut streak = Streak::new(StreakKind::DailyLearning);
        streak.record(day(5));
        assert!(!streak.record(day(5)));
        assert_eq!(streak.current, 1);
    }

    #[test]
    fn test_streak_gap_resets_but_keeps_longest() {
        let mut streak = Streak::new(StreakKind::DailyLogin);
        streak.record(day(1));
        streak.record(day(2));
        streak.record(day(5));
        assert_eq!(streak.current, 1);
        assert_eq!(streak.longest, 2);
    }

    #[test]
    fn test_lapsed_streak_reports_zero() {
        let mut profile = UserProgressionProfile::new("learner", 100, chrono::Utc::now());
        profile.touch_streak(StreakKind::DailyLearning, day(1));
        profile.touch_streak(StreakKind::DailyLearning, day(2));

        assert_eq!(profile.current_streak(StreakKind::DailyLearning, day(3)), 2);
        assert_eq!(profile.current_streak(StreakKind::DailyLearning, day(5)), 0);

        profile.expire_streaks(day(5));
        let streak = profile.streak(StreakKind::DailyLearning).unwrap();
        assert_eq!(streak.current, 0);
        assert_eq!(streak.longest, 2);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(
            ProgressCategory::parse("trading"),
            Some(ProgressCategory::Trading)
        );
        assert_eq!(ProgressCategory::parse("invalid_category"), None);
        assert_eq!(ProgressCategory::parse("Learning"), None);
    }
}
