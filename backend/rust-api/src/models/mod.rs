pub mod achievement;
pub mod challenge;
pub mod leaderboard;
pub mod profile;
pub mod requests;
pub mod xp_event;

pub use achievement::{
    AchievementCategory, AchievementDefinition, AchievementProgress, ActionPayload, ActionType,
    Rarity, Requirement, RequirementKind,
};
pub use challenge::{ChallengeType, DailyChallengeInstance};
pub use leaderboard::{LeaderboardEntry, LeaderboardPage, LeaderboardType, ScoreRecord};
pub use profile::{
    CategoryXp, LearningStats, ProgressCategory, Streak, StreakKind, UnlockedAchievement,
    UserProgressionProfile,
};
pub use requests::{
    AchievementCheckRequest, ChallengeProgressRequest, LeaderboardQuery, ProgressUpdateRequest,
    SubmitScoreRequest, XpEventsQuery,
};
pub use xp_event::{XpEvent, XpSource};
