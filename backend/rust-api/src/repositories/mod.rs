//! Storage seams for the progression core.
//!
//! Services only see these traits; the in-memory implementations in
//! [`memory`] back the running service and the tests.

use async_trait::async_trait;

use crate::error::ProgressionResult;
use crate::models::{ScoreRecord, UserProgressionProfile, XpEvent};

pub mod memory;

pub use memory::{InMemoryLeaderboardRepository, InMemoryProfileRepository, InMemoryXpEventRepository};

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get(&self, user_id: &str) -> ProgressionResult<Option<UserProgressionProfile>>;

    /// Insert or replace the profile keyed by its `user_id`
    async fn upsert(&self, profile: UserProgressionProfile) -> ProgressionResult<()>;

    async fn list(&self) -> ProgressionResult<Vec<UserProgressionProfile>>;
}

#[async_trait]
pub trait LeaderboardRepository: Send + Sync {
    async fn get(&self, user_id: &str) -> ProgressionResult<Option<ScoreRecord>>;

    async fn upsert(&self, record: ScoreRecord) -> ProgressionResult<()>;

    async fn list(&self) -> ProgressionResult<Vec<ScoreRecord>>;
}

#[async_trait]
pub trait XpEventRepository: Send + Sync {
    /// Append an event, keeping at most `retain` events for the user
    async fn append(&self, event: XpEvent, retain: usize) -> ProgressionResult<()>;

    /// Newest first
    async fn list_for_user(&self, user_id: &str, limit: usize) -> ProgressionResult<Vec<XpEvent>>;

    async fn clear_user(&self, user_id: &str) -> ProgressionResult<()>;
}
