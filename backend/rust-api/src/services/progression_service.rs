use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use super::achievement_catalog;
use super::challenge_tracker::ChallengeTracker;
use super::leaderboard_service::LeaderboardService;
use super::level_curve::LevelCurve;
use super::rule_evaluator::{ActionEvent, RuleEvaluator};
use crate::config::ProgressionSettings;
use crate::error::{ProgressionError, ProgressionResult};
use crate::metrics::{
    record_challenge_claim, ACHIEVEMENTS_UNLOCKED_TOTAL, LEVEL_UPS_TOTAL, PROFILES_TOTAL,
    XP_AWARDED_TOTAL,
};
use crate::models::{
    AchievementDefinition, AchievementProgress, ActionPayload, ChallengeType,
    DailyChallengeInstance, ProgressCategory, StreakKind, UnlockedAchievement,
    UserProgressionProfile, XpEvent, XpSource,
};
use crate::repositories::{ProfileRepository, XpEventRepository};
use crate::utils::time::Clock;

/// Largest XP amount a single progress update may carry
pub const MAX_PROGRESS_AMOUNT: u64 = 1_000_000;

/// One async mutex per user id. Holding the guard makes a profile
/// read-modify-write atomic with respect to other requests for that user.
/// Entries live only while someone holds or waits on them.
#[derive(Default)]
struct UserLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl UserLocks {
    async fn acquire(&self, user_id: &str) -> UserLockGuard<'_> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(user_id.to_string()).or_default().clone()
        };
        UserLockGuard {
            guard: Some(lock.lock_owned().await),
            locks: self,
            user_id: user_id.to_string(),
        }
    }

    fn release(&self, user_id: &str) {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        // Only the map holds it once every guard and waiter is gone
        if map
            .get(user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            map.remove(user_id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

struct UserLockGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a UserLocks,
    user_id: String,
}

impl Drop for UserLockGuard<'_> {
    fn drop(&mut self) {
        // Drop the owned guard first so its Arc no longer counts
        self.guard.take();
        self.locks.release(&self.user_id);
    }
}

/// Outcome of a single XP grant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XpGrant {
    pub levels_gained: u32,
    pub bonus_awarded: u64,
}

/// The progression store: owns every mutation of a user's profile.
pub struct ProgressionService {
    profiles: Arc<dyn ProfileRepository>,
    events: Arc<dyn XpEventRepository>,
    leaderboard: Arc<LeaderboardService>,
    clock: Arc<dyn Clock>,
    curve: LevelCurve,
    evaluator: RuleEvaluator,
    tracker: ChallengeTracker,
    settings: ProgressionSettings,
    locks: UserLocks,
}

impl ProgressionService {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        events: Arc<dyn XpEventRepository>,
        leaderboard: Arc<LeaderboardService>,
        clock: Arc<dyn Clock>,
        settings: ProgressionSettings,
    ) -> Self {
        Self {
            profiles,
            events,
            leaderboard,
            clock,
            curve: LevelCurve::new(settings.base_xp_per_level),
            evaluator: RuleEvaluator::new(settings.passing_quiz_score),
            tracker: ChallengeTracker::new(
                settings.daily_challenge_count,
                settings.challenge_retention_days,
            ),
            settings,
            locks: UserLocks::default(),
        }
    }

    pub fn level_curve(&self) -> &LevelCurve {
        &self.curve
    }

    /// Get-or-create. The leaderboard position is filled from the overall board.
    pub async fn get_user_profile(&self, user_id: &str) -> ProgressionResult<UserProgressionProfile> {
        let mut profile = {
            let _guard = self.locks.acquire(user_id).await;
            self.load_or_create(user_id).await?
        };
        profile.leaderboard_position = self.leaderboard.position_of(user_id).await;
        Ok(profile)
    }

    /// Adds `amount` XP under a recognized category.
    ///
    /// Returns `false` and leaves all state untouched when the category is
    /// not recognized. Amounts above [`MAX_PROGRESS_AMOUNT`] are rejected.
    pub async fn update_progress(
        &self,
        user_id: &str,
        category: &str,
        amount: u64,
    ) -> ProgressionResult<bool> {
        if amount > MAX_PROGRESS_AMOUNT {
            return Err(ProgressionError::validation(format!(
                "amount must be at most {}",
                MAX_PROGRESS_AMOUNT
            )));
        }

        let Some(category) = ProgressCategory::parse(category) else {
            tracing::debug!(
                "Ignoring progress update with unknown category: user={}, category={}",
                user_id,
                category
            );
            return Ok(false);
        };

        let _guard = self.locks.acquire(user_id).await;
        let now = self.clock.now();
        let today = now.date_naive();
        let mut profile = self.load_or_create(user_id).await?;
        let mut events = Vec::new();

        self.tracker.ensure_issued(&mut profile, today);

        let grant = self.grant_xp(&mut profile, amount, XpSource::Progress { category }, now, &mut events);
        profile.category_xp.add(category, amount);

        let mut contributions = vec![(ChallengeType::EarnXp, amount)];
        if category == ProgressCategory::Learning {
            profile.touch_streak(StreakKind::DailyLearning, today);
            contributions.push((ChallengeType::MaintainStreak, 1));
        }
        self.tracker
            .apply_contributions(&mut profile, &contributions, today);

        tracing::info!(
            "Progress updated: user={}, category={}, amount={}, xp={}, level={}, levels_gained={}",
            user_id,
            category.as_str(),
            amount,
            profile.xp,
            profile.level,
            grant.levels_gained
        );

        self.persist(profile, events, now).await?;
        Ok(true)
    }

    /// Records the action and unlocks every achievement it newly satisfies.
    ///
    /// Unknown action types yield an empty list without touching the profile.
    /// Achievements unlocked at most once per user, so replaying an action
    /// never re-awards XP.
    pub async fn check_achievements(
        &self,
        user_id: &str,
        action_type: &str,
        payload: Option<serde_json::Value>,
    ) -> ProgressionResult<Vec<AchievementDefinition>> {
        let Some(event) = ActionEvent::parse(action_type, payload) else {
            tracing::debug!(
                "No achievements apply to unknown action: user={}, action={}",
                user_id,
                action_type
            );
            return Ok(Vec::new());
        };

        let _guard = self.locks.acquire(user_id).await;
        let now = self.clock.now();
        let today = now.date_naive();
        let mut profile = self.load_or_create(user_id).await?;
        let mut events = Vec::new();

        self.tracker.ensure_issued(&mut profile, today);
        let contributions = self.evaluator.record_action(&mut profile, &event, today);
        self.tracker
            .apply_contributions(&mut profile, &contributions, today);

        // Rewards can satisfy XP/level requirements, so repeat until nothing new unlocks
        let mut unlocked = Vec::new();
        loop {
            let newly = self.evaluator.newly_satisfied(&profile, &event, today);
            if newly.is_empty() {
                break;
            }

            for definition in newly {
                profile.achievements.push(UnlockedAchievement {
                    achievement_id: definition.id.clone(),
                    unlocked_at: now,
                    progress: 100,
                });
                profile.total_points = profile.total_points.saturating_add(definition.xp_reward);
                self.grant_xp(
                    &mut profile,
                    definition.xp_reward,
                    XpSource::Achievement {
                        achievement_id: definition.id.clone(),
                    },
                    now,
                    &mut events,
                );

                ACHIEVEMENTS_UNLOCKED_TOTAL
                    .with_label_values(&[definition.rarity.as_str()])
                    .inc();
                tracing::info!(
                    "Achievement unlocked: user={}, achievement={}, reward={}",
                    user_id,
                    definition.id,
                    definition.xp_reward
                );
                unlocked.push(definition);
            }
        }

        self.persist(profile, events, now).await?;
        Ok(unlocked)
    }

    /// Every catalog achievement with this user's computed progress
    pub async fn achievement_progress(
        &self,
        user_id: &str,
    ) -> ProgressionResult<Vec<AchievementProgress>> {
        let profile = self.get_user_profile(user_id).await?;
        let payload = ActionPayload::default();
        let today = self.clock.today();

        Ok(achievement_catalog::all()
            .iter()
            .map(|definition| {
                let evaluated = self.evaluator.evaluate(definition, &profile, &payload, today);
                let unlocked_at = profile
                    .achievements
                    .iter()
                    .find(|a| a.achievement_id == definition.id)
                    .map(|a| a.unlocked_at);
                let progress = if unlocked_at.is_some() {
                    100
                } else {
                    evaluated.progress_percent()
                };

                AchievementProgress {
                    achievement: evaluated,
                    progress,
                    unlocked: unlocked_at.is_some(),
                    unlocked_at,
                }
            })
            .collect())
    }

    /// Today's challenge instances, issuing them on the first call of the day
    pub async fn todays_challenges(
        &self,
        user_id: &str,
    ) -> ProgressionResult<Vec<DailyChallengeInstance>> {
        let _guard = self.locks.acquire(user_id).await;
        let now = self.clock.now();
        let today = now.date_naive();
        let mut profile = self.load_or_create(user_id).await?;

        let challenges = if self.tracker.ensure_issued(&mut profile, today) {
            let challenges = self.tracker.todays(&profile, today);
            self.persist(profile, Vec::new(), now).await?;
            challenges
        } else {
            self.tracker.todays(&profile, today)
        };
        Ok(challenges)
    }

    /// Reports progress on one challenge. `None` for unknown users or ids.
    pub async fn update_challenge_progress(
        &self,
        user_id: &str,
        challenge_id: &str,
        progress: u64,
    ) -> ProgressionResult<Option<DailyChallengeInstance>> {
        let _guard = self.locks.acquire(user_id).await;
        let Some(mut profile) = self.profiles.get(user_id).await? else {
            return Ok(None);
        };
        let now = self.clock.now();
        let today = now.date_naive();

        self.tracker.ensure_issued(&mut profile, today);
        let updated = self
            .tracker
            .update_progress(&mut profile, challenge_id, progress, today);

        if updated.is_some() {
            self.persist(profile, Vec::new(), now).await?;
        }
        Ok(updated)
    }

    /// Grants the challenge reward once. `false` for unknown, incomplete or
    /// already-claimed challenges.
    pub async fn claim_daily_challenge_reward(
        &self,
        user_id: &str,
        challenge_id: &str,
    ) -> ProgressionResult<bool> {
        let _guard = self.locks.acquire(user_id).await;
        let Some(mut profile) = self.profiles.get(user_id).await? else {
            record_challenge_claim(false);
            return Ok(false);
        };
        let now = self.clock.now();

        let Some(reward) = self.tracker.claim(&mut profile, challenge_id, now) else {
            tracing::debug!(
                "Challenge claim rejected: user={}, challenge={}",
                user_id,
                challenge_id
            );
            record_challenge_claim(false);
            return Ok(false);
        };

        let mut events = Vec::new();
        self.grant_xp(
            &mut profile,
            reward,
            XpSource::Challenge {
                challenge_id: challenge_id.to_string(),
            },
            now,
            &mut events,
        );

        tracing::info!(
            "Challenge reward claimed: user={}, challenge={}, reward={}",
            user_id,
            challenge_id,
            reward
        );

        self.persist(profile, events, now).await?;
        record_challenge_claim(true);
        Ok(true)
    }

    /// Most recent XP events, newest first
    pub async fn xp_events(&self, user_id: &str, limit: usize) -> ProgressionResult<Vec<XpEvent>> {
        self.events.list_for_user(user_id, limit).await
    }

    /// Administrative reset back to defaults. The only path where XP goes down.
    pub async fn reset_progress(&self, user_id: &str) -> ProgressionResult<UserProgressionProfile> {
        let _guard = self.locks.acquire(user_id).await;
        let now = self.clock.now();
        let existing = self.load_or_create(user_id).await?;

        let mut fresh = self.new_profile(user_id, now);
        fresh.created_at = existing.created_at;
        self.profiles.upsert(fresh.clone()).await?;
        self.events.clear_user(user_id).await?;

        tracing::warn!(
            "Progress reset: user={}, previous_xp={}, previous_level={}",
            user_id,
            existing.xp,
            existing.level
        );
        Ok(fresh)
    }

    /// Adds XP, then applies the level-up bonus for every level gained until
    /// the level stops moving. Leaves `level`/`xp_to_next_level` consistent.
    ///
    /// Logs at most two events: the grant itself and one `LevelUpBonus`
    /// spanning every level crossed.
    pub fn grant_xp(
        &self,
        profile: &mut UserProgressionProfile,
        amount: u64,
        source: XpSource,
        now: DateTime<Utc>,
        events: &mut Vec<XpEvent>,
    ) -> XpGrant {
        if amount == 0 {
            return XpGrant::default();
        }

        let starting_level = profile.level;
        profile.xp = profile.xp.saturating_add(amount);
        XP_AWARDED_TOTAL
            .with_label_values(&[source.label()])
            .inc_by(amount);
        events.push(Self::event(&profile.user_id, amount, source, now));

        // Each pass pays for a whole batch of levels; repeats only while the
        // bonus itself crosses another threshold
        let bonus = self.settings.level_up_bonus_xp;
        let mut settled = starting_level;
        let mut bonus_awarded = 0u64;
        while bonus > 0 {
            let reached = self.curve.level_for(profile.xp).level;
            if reached <= settled {
                break;
            }
            let award = u64::from(reached - settled).saturating_mul(bonus);
            profile.xp = profile.xp.saturating_add(award);
            bonus_awarded = bonus_awarded.saturating_add(award);
            settled = reached;
        }

        self.refresh_level(profile);
        let levels_gained = profile.level.saturating_sub(starting_level);

        if bonus_awarded > 0 {
            let source = XpSource::LevelUpBonus {
                from_level: starting_level,
                to_level: profile.level,
            };
            XP_AWARDED_TOTAL
                .with_label_values(&[source.label()])
                .inc_by(bonus_awarded);
            events.push(Self::event(&profile.user_id, bonus_awarded, source, now));
        }

        if levels_gained > 0 {
            LEVEL_UPS_TOTAL.inc_by(u64::from(levels_gained));
            tracing::info!(
                "Level up: user={}, level {} -> {}, bonus_xp={}",
                profile.user_id,
                starting_level,
                profile.level,
                bonus_awarded
            );
        }

        XpGrant {
            levels_gained,
            bonus_awarded,
        }
    }

    fn refresh_level(&self, profile: &mut UserProgressionProfile) {
        let info = self.curve.level_for(profile.xp);
        profile.level = info.level;
        profile.xp_to_next_level = info.xp_to_next;
    }

    fn new_profile(&self, user_id: &str, now: DateTime<Utc>) -> UserProgressionProfile {
        UserProgressionProfile::new(user_id, self.curve.level_for(0).xp_to_next, now)
    }

    fn event(user_id: &str, amount: u64, source: XpSource, now: DateTime<Utc>) -> XpEvent {
        XpEvent {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            amount,
            source,
            created_at: now,
        }
    }

    /// Caller must hold the user's lock. Lapsed streaks come back zeroed.
    async fn load_or_create(&self, user_id: &str) -> ProgressionResult<UserProgressionProfile> {
        if let Some(mut profile) = self.profiles.get(user_id).await? {
            profile.expire_streaks(self.clock.today());
            return Ok(profile);
        }

        let profile = self.new_profile(user_id, self.clock.now());
        self.profiles.upsert(profile.clone()).await?;
        PROFILES_TOTAL.inc();
        tracing::info!("Created progression profile for user={}", user_id);
        Ok(profile)
    }

    async fn persist(
        &self,
        mut profile: UserProgressionProfile,
        events: Vec<XpEvent>,
        now: DateTime<Utc>,
    ) -> ProgressionResult<()> {
        profile.updated_at = now;
        // Derived on read; never stored
        profile.leaderboard_position = None;
        self.profiles.upsert(profile).await?;

        for event in events {
            self.events.append(event, self.settings.xp_event_limit).await?;
        }
        Ok(())
    }
}
