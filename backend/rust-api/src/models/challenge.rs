use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeType {
    CompleteModules,
    PassQuizzes,
    EarnXp,
    ExecuteTrades,
    MaintainStreak,
}

impl ChallengeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeType::CompleteModules => "complete_modules",
            ChallengeType::PassQuizzes => "pass_quizzes",
            ChallengeType::EarnXp => "earn_xp",
            ChallengeType::ExecuteTrades => "execute_trades",
            ChallengeType::MaintainStreak => "maintain_streak",
        }
    }
}

/// One day's instance of a challenge for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyChallengeInstance {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub challenge_type: ChallengeType,
    pub target: u64,
    pub xp_reward: u64,
    pub bonus_reward: Option<u64>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub progress: u64,
    pub is_completed: bool,
    pub is_claimed: bool,
    pub claimed_at: Option<DateTime<Utc>>,
}

impl DailyChallengeInstance {
    /// Whether this instance belongs to `day` (date comparison, not time-of-day)
    pub fn is_for_day(&self, day: NaiveDate) -> bool {
        self.start_date.date_naive() == day
    }

    /// Stores `min(reported, target)`. Once completed, progress stays at
    /// target and later reports are ignored.
    /// Returns true when this call flipped the challenge to completed.
    pub fn set_progress(&mut self, reported: u64) -> bool {
        if self.is_completed {
            return false;
        }
        self.progress = reported.min(self.target);
        if !self.is_completed && self.progress >= self.target {
            self.is_completed = true;
            return true;
        }
        false
    }

    pub fn advance(&mut self, delta: u64) -> bool {
        self.set_progress(self.progress.saturating_add(delta))
    }

    pub fn total_reward(&self) -> u64 {
        self.xp_reward
            .saturating_add(self.bonus_reward.unwrap_or(0))
    }

    pub fn is_claimable(&self) -> bool {
        self.is_completed && !self.is_claimed
    }
}
