use std::sync::Arc;

use crate::config::Config;
use crate::repositories::{
    InMemoryLeaderboardRepository, InMemoryProfileRepository, InMemoryXpEventRepository,
    ProfileRepository,
};
use crate::utils::time::{Clock, SystemClock};

pub mod achievement_catalog;
pub mod challenge_tracker;
pub mod leaderboard_service;
pub mod level_curve;
pub mod progression_service;
pub mod rule_evaluator;

use leaderboard_service::LeaderboardService;
use progression_service::ProgressionService;

pub struct AppState {
    pub config: Config,
    pub progression: Arc<ProgressionService>,
    pub leaderboard: Arc<LeaderboardService>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Wires in-memory repositories around the given clock
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Self {
        let profiles: Arc<dyn ProfileRepository> = Arc::new(InMemoryProfileRepository::new());

        let leaderboard = Arc::new(LeaderboardService::new(
            Arc::new(InMemoryLeaderboardRepository::new()),
            profiles.clone(),
            clock.clone(),
            config.leaderboard.clone(),
        ));

        let progression = Arc::new(ProgressionService::new(
            profiles,
            Arc::new(InMemoryXpEventRepository::new()),
            leaderboard.clone(),
            clock,
            config.progression.clone(),
        ));

        tracing::info!(
            "Progression engine ready: base_xp_per_level={}, daily_challenges={}",
            config.progression.base_xp_per_level,
            config.progression.daily_challenge_count
        );

        Self {
            config,
            progression,
            leaderboard,
        }
    }
}
