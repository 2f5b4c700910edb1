use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::LeaderboardSettings;
use crate::error::ProgressionResult;
use crate::metrics::LEADERBOARD_SUBMISSIONS_TOTAL;
use crate::models::{LeaderboardEntry, LeaderboardPage, LeaderboardType, ScoreRecord};
use crate::repositories::{LeaderboardRepository, ProfileRepository};
use crate::utils::time::{start_of_month, start_of_week, Clock};

/// Sorts by score descending, ties broken by ascending user id, and assigns
/// 1-based ranks. Caller-supplied `rank`/`change` values are overwritten;
/// `change` is measured against `previous` (0 for users not in it).
pub fn rank(
    mut entries: Vec<LeaderboardEntry>,
    previous: &HashMap<String, u32>,
) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index as u32 + 1;
        entry.change = previous
            .get(&entry.user_id)
            .map(|&old| old as i64 - entry.rank as i64)
            .unwrap_or(0);
    }

    entries
}

#[derive(Debug, Clone, Default)]
struct BoardSnapshot {
    window_start: Option<DateTime<Utc>>,
    entries: Vec<LeaderboardEntry>,
}

impl BoardSnapshot {
    fn ranks(&self) -> HashMap<String, u32> {
        self.entries
            .iter()
            .map(|e| (e.user_id.clone(), e.rank))
            .collect()
    }
}

fn window_start(board: LeaderboardType, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match board {
        LeaderboardType::Overall => None,
        LeaderboardType::Weekly => Some(start_of_week(now)),
        LeaderboardType::Monthly => Some(start_of_month(now)),
    }
}

/// Score table plus ranked snapshots for each board type.
///
/// Snapshots are rebuilt on every submission; readers may see a snapshot that
/// is one submission behind.
pub struct LeaderboardService {
    records: Arc<dyn LeaderboardRepository>,
    profiles: Arc<dyn ProfileRepository>,
    clock: Arc<dyn Clock>,
    settings: LeaderboardSettings,
    snapshots: RwLock<HashMap<LeaderboardType, BoardSnapshot>>,
}

impl LeaderboardService {
    pub fn new(
        records: Arc<dyn LeaderboardRepository>,
        profiles: Arc<dyn ProfileRepository>,
        clock: Arc<dyn Clock>,
        settings: LeaderboardSettings,
    ) -> Self {
        Self {
            records,
            profiles,
            clock,
            settings,
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    /// Upserts the user's score and re-ranks every board.
    pub async fn submit_score(
        &self,
        user_id: &str,
        score: u64,
        achievements: u32,
    ) -> ProgressionResult<LeaderboardEntry> {
        let now = self.clock.now();
        let level = self
            .profiles
            .get(user_id)
            .await?
            .map(|profile| profile.level)
            .unwrap_or(1);

        let is_new = self.records.get(user_id).await?.is_none();
        let record = ScoreRecord {
            user_id: user_id.to_string(),
            score,
            level,
            achievements,
            submitted_at: now,
        };
        self.records.upsert(record.clone()).await?;
        LEADERBOARD_SUBMISSIONS_TOTAL.inc();

        tracing::info!(
            "Score submitted: user={}, score={}, level={}, new_entry={}",
            user_id,
            score,
            level,
            is_new
        );

        self.rerank_all(now).await?;

        let snapshots = self.snapshots.read().await;
        let entry = snapshots
            .get(&LeaderboardType::Overall)
            .and_then(|s| s.entries.iter().find(|e| e.user_id == user_id).cloned())
            .unwrap_or_else(|| LeaderboardEntry::from(&record));
        Ok(entry)
    }

    pub async fn get_leaderboard(
        &self,
        board: LeaderboardType,
        limit: usize,
        current_user: Option<&str>,
    ) -> ProgressionResult<LeaderboardPage> {
        let now = self.clock.now();
        let expected_window = window_start(board, now);

        let needs_rerank = {
            let snapshots = self.snapshots.read().await;
            snapshots
                .get(&board)
                .is_none_or(|s| s.window_start != expected_window)
        };
        if needs_rerank {
            let mut snapshots = self.snapshots.write().await;
            let records = self.records.list().await?;
            Self::rerank(&mut snapshots, board, &records, now);
        }

        let snapshots = self.snapshots.read().await;
        let entries = snapshots
            .get(&board)
            .map(|s| s.entries.as_slice())
            .unwrap_or_default();

        let limit = limit.min(self.settings.max_limit);
        Ok(LeaderboardPage {
            board,
            entries: entries.iter().take(limit).cloned().collect(),
            current_user_rank: current_user
                .and_then(|user| entries.iter().find(|e| e.user_id == user))
                .map(|e| e.rank),
            total: entries.len(),
        })
    }

    /// Rank on the overall board, if the user has submitted a score
    pub async fn position_of(&self, user_id: &str) -> Option<u32> {
        self.snapshots
            .read()
            .await
            .get(&LeaderboardType::Overall)
            .and_then(|s| s.entries.iter().find(|e| e.user_id == user_id))
            .map(|e| e.rank)
    }

    async fn rerank_all(&self, now: DateTime<Utc>) -> ProgressionResult<()> {
        let mut snapshots = self.snapshots.write().await;
        let records = self.records.list().await?;
        for board in LeaderboardType::ALL {
            Self::rerank(&mut snapshots, board, &records, now);
        }
        Ok(())
    }

    fn rerank(
        snapshots: &mut HashMap<LeaderboardType, BoardSnapshot>,
        board: LeaderboardType,
        records: &[ScoreRecord],
        now: DateTime<Utc>,
    ) {
        let window = window_start(board, now);
        let previous = snapshots
            .get(&board)
            .map(BoardSnapshot::ranks)
            .unwrap_or_default();

        let entries = records
            .iter()
            .filter(|r| window.is_none_or(|start| r.submitted_at >= start))
            .map(LeaderboardEntry::from)
            .collect();

        let ranked = rank(entries, &previous);
        tracing::debug!(
            "Re-ranked {} leaderboard: {} entries",
            board.as_str(),
            ranked.len()
        );

        snapshots.insert(
            board,
            BoardSnapshot {
                window_start: window,
                entries: ranked,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{InMemoryLeaderboardRepository, InMemoryProfileRepository};
    use crate::utils::time::FixedClock;
    use chrono::{Duration, TimeZone};

    fn entry(user_id: &str, score: u64, rank: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            user_id: user_id.to_string(),
            score,
            level: 1,
            rank,
            change: 0,
            achievements: 0,
        }
    }

    fn service(clock: FixedClock) -> LeaderboardService {
        LeaderboardService::new(
            Arc::new(InMemoryLeaderboardRepository::new()),
            Arc::new(InMemoryProfileRepository::new()),
            Arc::new(clock),
            LeaderboardSettings::default(),
        )
    }

    fn saturday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_rank_ignores_supplied_rank_and_breaks_ties_by_user_id() {
        let ranked = rank(
            vec![entry("carol", 50, 9), entry("bob", 80, 9), entry("alice", 50, 1)],
            &HashMap::new(),
        );

        let order: Vec<(&str, u32)> = ranked.iter().map(|e| (e.user_id.as_str(), e.rank)).collect();
        assert_eq!(order, vec![("bob", 1), ("alice", 2), ("carol", 3)]);
    }

    #[test]
    fn test_rank_is_deterministic() {
        let input = vec![entry("b", 10, 0), entry("a", 10, 0), entry("c", 30, 0)];
        let first = rank(input.clone(), &HashMap::new());
        let mut reversed = input;
        reversed.reverse();
        assert_eq!(first, rank(reversed, &HashMap::new()));
    }

    #[test]
    fn test_rank_change_against_previous() {
        let previous = HashMap::from([("a".to_string(), 1), ("b".to_string(), 2)]);
        let ranked = rank(vec![entry("a", 10, 0), entry("b", 20, 0), entry("c", 5, 0)], &previous);

        assert_eq!(ranked[0].user_id, "b");
        assert_eq!(ranked[0].change, 1);
        assert_eq!(ranked[1].change, -1);
        assert_eq!(ranked[2].change, 0);
    }

    #[tokio::test]
    async fn test_submit_is_upsert() {
        let svc = service(FixedClock::new(saturday()));
        svc.submit_score("alice", 100, 1).await.unwrap();
        let entry = svc.submit_score("alice", 100, 1).await.unwrap();

        assert_eq!(entry.rank, 1);
        assert_eq!(entry.level, 1);
        let page = svc
            .get_leaderboard(LeaderboardType::Overall, 10, None)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_limit_does_not_change_total() {
        let svc = service(FixedClock::new(saturday()));
        for (i, user) in ["u1", "u2", "u3", "u4"].iter().enumerate() {
            svc.submit_score(user, (i as u64 + 1) * 10, 0).await.unwrap();
        }

        let page = svc
            .get_leaderboard(LeaderboardType::Overall, 2, Some("u1"))
            .await
            .unwrap();
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.total, 4);
        assert_eq!(page.entries[0].user_id, "u4");
        assert_eq!(page.current_user_rank, Some(4));
        assert_eq!(svc.position_of("u4").await, Some(1));
        assert_eq!(svc.position_of("ghost").await, None);
    }

    #[tokio::test]
    async fn test_weekly_board_drops_old_submissions() {
        let clock = FixedClock::new(saturday());
        let svc = service(clock.clone());
        svc.submit_score("early", 500, 0).await.unwrap();

        // Following Tuesday: new week, same month
        clock.advance(Duration::days(3));
        svc.submit_score("late", 10, 0).await.unwrap();

        let weekly = svc
            .get_leaderboard(LeaderboardType::Weekly, 10, None)
            .await
            .unwrap();
        assert_eq!(weekly.total, 1);
        assert_eq!(weekly.entries[0].user_id, "late");

        let monthly = svc
            .get_leaderboard(LeaderboardType::Monthly, 10, None)
            .await
            .unwrap();
        assert_eq!(monthly.total, 2);
    }

    #[tokio::test]
    async fn test_weekly_board_rolls_over_without_submissions() {
        let clock = FixedClock::new(saturday());
        let svc = service(clock.clone());
        svc.submit_score("alice", 50, 0).await.unwrap();

        clock.advance(Duration::days(7));
        let weekly = svc
            .get_leaderboard(LeaderboardType::Weekly, 10, None)
            .await
            .unwrap();
        assert_eq!(weekly.total, 0);
    }
}
