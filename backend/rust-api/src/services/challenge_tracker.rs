use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::models::{ChallengeType, DailyChallengeInstance, UserProgressionProfile};
use crate::utils::time::start_of_day;

struct ChallengeTemplate {
    challenge_type: ChallengeType,
    title: &'static str,
    description: &'static str,
    target: u64,
    xp_reward: u64,
    bonus_reward: Option<u64>,
}

const TEMPLATES: [ChallengeTemplate; 5] = [
    ChallengeTemplate {
        challenge_type: ChallengeType::CompleteModules,
        title: "Knowledge Builder",
        description: "Complete 2 learning modules",
        target: 2,
        xp_reward: 50,
        bonus_reward: None,
    },
    ChallengeTemplate {
        challenge_type: ChallengeType::PassQuizzes,
        title: "Quiz Sprint",
        description: "Pass 3 quizzes",
        target: 3,
        xp_reward: 75,
        bonus_reward: Some(25),
    },
    ChallengeTemplate {
        challenge_type: ChallengeType::EarnXp,
        title: "XP Hunter",
        description: "Earn 200 XP from learning activities",
        target: 200,
        xp_reward: 100,
        bonus_reward: None,
    },
    ChallengeTemplate {
        challenge_type: ChallengeType::ExecuteTrades,
        title: "Market Practice",
        description: "Execute 5 practice trades",
        target: 5,
        xp_reward: 60,
        bonus_reward: Some(20),
    },
    ChallengeTemplate {
        challenge_type: ChallengeType::MaintainStreak,
        title: "Stay Consistent",
        description: "Do any learning activity today",
        target: 1,
        xp_reward: 30,
        bonus_reward: None,
    },
];

/// Issues, advances and settles daily challenges on a profile.
///
/// All methods mutate the profile in place; persisting it is the caller's job.
#[derive(Debug, Clone)]
pub struct ChallengeTracker {
    daily_count: usize,
    retention_days: i64,
}

impl ChallengeTracker {
    pub fn new(daily_count: usize, retention_days: i64) -> Self {
        Self {
            daily_count: daily_count.min(TEMPLATES.len()),
            retention_days: retention_days.max(0),
        }
    }

    pub fn challenge_id(day: NaiveDate, challenge_type: ChallengeType) -> String {
        format!("{}-{}", day.format("%Y-%m-%d"), challenge_type.as_str())
    }

    /// Issues `day`'s instances unless the profile already has them.
    /// Returns true when new instances were added.
    pub fn ensure_issued(&self, profile: &mut UserProgressionProfile, day: NaiveDate) -> bool {
        if profile.daily_challenges.iter().any(|c| c.is_for_day(day)) {
            return false;
        }

        let cutoff = day - Duration::days(self.retention_days);
        profile
            .daily_challenges
            .retain(|c| c.start_date.date_naive() >= cutoff);

        let start = start_of_day(day);
        let offset = day.ordinal0() as usize;
        for i in 0..self.daily_count {
            let template = &TEMPLATES[(offset + i) % TEMPLATES.len()];
            profile.daily_challenges.push(DailyChallengeInstance {
                id: Self::challenge_id(day, template.challenge_type),
                title: template.title.to_string(),
                description: template.description.to_string(),
                challenge_type: template.challenge_type,
                target: template.target,
                xp_reward: template.xp_reward,
                bonus_reward: template.bonus_reward,
                start_date: start,
                end_date: start + Duration::days(1),
                progress: 0,
                is_completed: false,
                is_claimed: false,
                claimed_at: None,
            });
        }

        tracing::debug!(
            "Issued {} daily challenges for user={} day={}",
            self.daily_count,
            profile.user_id,
            day
        );
        true
    }

    /// Instances whose start date is `day`
    pub fn todays(
        &self,
        profile: &UserProgressionProfile,
        day: NaiveDate,
    ) -> Vec<DailyChallengeInstance> {
        profile
            .daily_challenges
            .iter()
            .filter(|c| c.is_for_day(day))
            .cloned()
            .collect()
    }

    /// Advances today's instances by activity deltas. Returns ids that
    /// became completed.
    pub fn apply_contributions(
        &self,
        profile: &mut UserProgressionProfile,
        contributions: &[(ChallengeType, u64)],
        day: NaiveDate,
    ) -> Vec<String> {
        let mut completed = Vec::new();
        for &(challenge_type, delta) in contributions {
            for challenge in profile
                .daily_challenges
                .iter_mut()
                .filter(|c| c.is_for_day(day) && c.challenge_type == challenge_type)
            {
                if challenge.advance(delta) {
                    completed.push(challenge.id.clone());
                }
            }
        }
        completed
    }

    /// Sets reported progress on an active instance.
    ///
    /// `None` for an unknown id; instances from earlier days are returned
    /// unchanged.
    pub fn update_progress(
        &self,
        profile: &mut UserProgressionProfile,
        challenge_id: &str,
        reported: u64,
        day: NaiveDate,
    ) -> Option<DailyChallengeInstance> {
        let challenge = profile
            .daily_challenges
            .iter_mut()
            .find(|c| c.id == challenge_id)?;

        if !challenge.is_for_day(day) {
            return Some(challenge.clone());
        }

        if challenge.set_progress(reported) {
            tracing::info!(
                "Daily challenge completed: user={}, challenge={}",
                profile.user_id,
                challenge_id
            );
        }
        Some(challenge.clone())
    }

    /// Marks the challenge claimed and returns the reward, or `None` when it
    /// is unknown, not completed, or already claimed.
    pub fn claim(
        &self,
        profile: &mut UserProgressionProfile,
        challenge_id: &str,
        now: DateTime<Utc>,
    ) -> Option<u64> {
        let challenge = profile
            .daily_challenges
            .iter_mut()
            .find(|c| c.id == challenge_id)?;

        if !challenge.is_claimable() {
            return None;
        }

        challenge.is_claimed = true;
        challenge.claimed_at = Some(now);
        Some(challenge.total_reward())
    }
}
