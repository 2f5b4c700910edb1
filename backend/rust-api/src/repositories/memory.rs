use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

use super::{LeaderboardRepository, ProfileRepository, XpEventRepository};
use crate::error::ProgressionResult;
use crate::models::{ScoreRecord, UserProgressionProfile, XpEvent};

/// Process-lifetime profile table
#[derive(Debug, Default)]
pub struct InMemoryProfileRepository {
    profiles: RwLock<HashMap<String, UserProgressionProfile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn get(&self, user_id: &str) -> ProgressionResult<Option<UserProgressionProfile>> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn upsert(&self, profile: UserProgressionProfile) -> ProgressionResult<()> {
        self.profiles
            .write()
            .await
            .insert(profile.user_id.clone(), profile);
        Ok(())
    }

    async fn list(&self) -> ProgressionResult<Vec<UserProgressionProfile>> {
        Ok(self.profiles.read().await.values().cloned().collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLeaderboardRepository {
    records: RwLock<HashMap<String, ScoreRecord>>,
}

impl InMemoryLeaderboardRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaderboardRepository for InMemoryLeaderboardRepository {
    async fn get(&self, user_id: &str) -> ProgressionResult<Option<ScoreRecord>> {
        Ok(self.records.read().await.get(user_id).cloned())
    }

    async fn upsert(&self, record: ScoreRecord) -> ProgressionResult<()> {
        self.records
            .write()
            .await
            .insert(record.user_id.clone(), record);
        Ok(())
    }

    async fn list(&self) -> ProgressionResult<Vec<ScoreRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryXpEventRepository {
    events: RwLock<HashMap<String, VecDeque<XpEvent>>>,
}

impl InMemoryXpEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl XpEventRepository for InMemoryXpEventRepository {
    async fn append(&self, event: XpEvent, retain: usize) -> ProgressionResult<()> {
        let mut events = self.events.write().await;
        let log = events.entry(event.user_id.clone()).or_default();
        log.push_back(event);
        while log.len() > retain {
            log.pop_front();
        }
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str, limit: usize) -> ProgressionResult<Vec<XpEvent>> {
        Ok(self
            .events
            .read()
            .await
            .get(user_id)
            .map(|log| log.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn clear_user(&self, user_id: &str) -> ProgressionResult<()> {
        self.events.write().await.remove(user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProgressCategory, XpSource};
    use chrono::Utc;

    fn event(user_id: &str, amount: u64) -> XpEvent {
        XpEvent {
            id: format!("evt-{}", amount),
            user_id: user_id.to_string(),
            amount,
            source: XpSource::Progress {
                category: ProgressCategory::Learning,
            },
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_profile_upsert_replaces() {
        let repo = InMemoryProfileRepository::new();
        let mut profile = UserProgressionProfile::new("u1", 100, Utc::now());
        repo.upsert(profile.clone()).await.unwrap();

        profile.xp = 40;
        repo.upsert(profile).await.unwrap();

        assert_eq!(repo.list().await.unwrap().len(), 1);
        assert_eq!(repo.get("u1").await.unwrap().unwrap().xp, 40);
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_xp_events_newest_first_and_bounded() {
        let repo = InMemoryXpEventRepository::new();
        for amount in 1..=5 {
            repo.append(event("u1", amount), 3).await.unwrap();
        }

        let events = repo.list_for_user("u1", 10).await.unwrap();
        let amounts: Vec<u64> = events.iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![5, 4, 3]);

        let limited = repo.list_for_user("u1", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].amount, 5);
    }
}
