//! Leaderboard Service
//!
//! Facade over a shared [`RankedIndex`]: validates and encodes updates,
//! decodes keys back into display scores, and converts 0-based ranks into
//! 1-based [`RankInfo`] rows.
//!
//! Unknown players are an expected condition, never an error:
//! - `get_player_rank` returns a rank of -1
//! - `get_player_rank_range` returns an empty window

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LeaderboardConfig;
use crate::core::key::{try_encode, KeyError};
use crate::index::ranked::{RankedIndex, UpsertOutcome};
use crate::index::snapshot::{IndexSnapshot, SnapshotError};
use crate::index::IndexError;
use super::rank_info::RankInfo;

/// Service errors.
#[derive(Debug, Error)]
pub enum LeaderboardError {
    /// Score or timestamp out of range. Nothing was changed.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] KeyError),
    /// The index is corrupt or unusable.
    #[error(transparent)]
    Index(#[from] IndexError),
    /// Snapshot could not be taken or applied.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Public leaderboard operations. Cheap to clone; clones share one index.
#[derive(Debug, Clone)]
pub struct LeaderboardService {
    index: Arc<RankedIndex>,
}

impl LeaderboardService {
    /// Create a service over a fresh index.
    pub fn new(config: &LeaderboardConfig) -> Self {
        Self::with_index(Arc::new(RankedIndex::with_capacity(
            config.name.clone(),
            config.initial_capacity,
        )))
    }

    /// Create a service over an existing index.
    pub fn with_index(index: Arc<RankedIndex>) -> Self {
        Self { index }
    }

    /// Underlying index.
    pub fn index(&self) -> &Arc<RankedIndex> {
        &self.index
    }

    /// Record a player's latest score.
    ///
    /// Replaces any previous score. Ties on score go to the earlier timestamp.
    pub fn update_score(
        &self,
        player_id: &str,
        score: i64,
        timestamp: i64,
    ) -> Result<UpsertOutcome, LeaderboardError> {
        let key = try_encode(score, timestamp).map_err(|e| {
            warn!(player = player_id, score, timestamp, "rejected update: {}", e);
            e
        })?;
        Ok(self.index.upsert(player_id, key)?)
    }

    /// Record a player's latest score stamped with the current time.
    pub fn update_score_now(
        &self,
        player_id: &str,
        score: i64,
    ) -> Result<UpsertOutcome, LeaderboardError> {
        self.update_score(player_id, score, Utc::now().timestamp_millis())
    }

    /// A player's 1-based rank and score, or the unranked sentinel.
    pub fn get_player_rank(&self, player_id: &str) -> Result<RankInfo, LeaderboardError> {
        let info = match self.index.rank_of(player_id)? {
            Some(pos) => RankInfo {
                rank: pos.rank as i64 + 1,
                score: Some(pos.key.score()),
                player_id: player_id.to_string(),
            },
            None => RankInfo::unranked(player_id),
        };
        debug!(player = player_id, rank = info.rank, "rank lookup");
        Ok(info)
    }

    /// The `n` highest-ranked players. Empty for `n <= 0`.
    pub fn get_top_n(&self, n: i64) -> Result<Vec<RankInfo>, LeaderboardError> {
        if n <= 0 {
            return Ok(Vec::new());
        }
        let rows = self.index.range_by_rank(0, n - 1)?;
        Ok(rows.into_iter().map(RankInfo::from).collect())
    }

    /// Players within `window` ranks of `player_id`, including the player.
    ///
    /// Returns an empty list for unknown players, and for negative windows
    /// since the bounds then cross.
    pub fn get_player_rank_range(
        &self,
        player_id: &str,
        window: i64,
    ) -> Result<Vec<RankInfo>, LeaderboardError> {
        let Some(pos) = self.index.rank_of(player_id)? else {
            debug!(player = player_id, "rank window for unknown player");
            return Ok(Vec::new());
        };
        let rank = pos.rank as i64;
        let rows = self
            .index
            .range_by_rank(rank.saturating_sub(window), rank.saturating_add(window))?;
        Ok(rows.into_iter().map(RankInfo::from).collect())
    }

    /// Remove a player. Returns `true` if they were present.
    pub fn remove_player(&self, player_id: &str) -> Result<bool, LeaderboardError> {
        Ok(self.index.remove(player_id)?.is_some())
    }

    /// Number of ranked players.
    pub fn len(&self) -> Result<usize, LeaderboardError> {
        Ok(self.index.size()?)
    }

    /// Is the leaderboard empty?
    pub fn is_empty(&self) -> Result<bool, LeaderboardError> {
        Ok(self.len()? == 0)
    }

    /// Copy the current contents.
    pub fn snapshot(&self) -> Result<IndexSnapshot, LeaderboardError> {
        Ok(self.index.snapshot()?)
    }

    /// Replace the current contents with a snapshot's.
    pub fn restore(&self, snapshot: &IndexSnapshot) -> Result<(), LeaderboardError> {
        Ok(self.index.restore(snapshot)?)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::key::{SCORE_LIMIT, TIMESTAMP_LIMIT};

    fn service() -> LeaderboardService {
        LeaderboardService::new(&LeaderboardConfig::default())
    }

    fn scenario() -> LeaderboardService {
        let svc = service();
        svc.update_score("player1", 100, 1743150268969).unwrap();
        svc.update_score("player3", 150, 1743150268969).unwrap();
        svc.update_score("player2", 100, 1743150268970).unwrap();
        svc
    }

    fn ids(rows: &[RankInfo]) -> Vec<&str> {
        rows.iter().map(|r| r.player_id.as_str()).collect()
    }

    #[test]
    fn test_get_player_rank() {
        let svc = scenario();
        assert_eq!(
            svc.get_player_rank("player1").unwrap(),
            RankInfo { rank: 2, score: Some(100), player_id: "player1".to_string() }
        );
        assert_eq!(svc.get_player_rank("player3").unwrap().rank, 1);
        assert_eq!(svc.get_player_rank("player2").unwrap().rank, 3);
    }

    #[test]
    fn test_unknown_player_rank() {
        let svc = scenario();
        let info = svc.get_player_rank("unknown_player").unwrap();
        assert_eq!(info.rank, -1);
        assert_eq!(info.score, None);
        assert_eq!(info.player_id, "unknown_player");
    }

    #[test]
    fn test_get_top_n() {
        let svc = scenario();
        let top = svc.get_top_n(2).unwrap();
        assert_eq!(ids(&top), ["player3", "player1"]);
        assert_eq!(top[0].rank, 1);
        assert_eq!(top[0].score, Some(150));
        assert_eq!(top[1].rank, 2);

        assert!(svc.get_top_n(0).unwrap().is_empty());
        assert!(svc.get_top_n(-3).unwrap().is_empty());
        assert_eq!(svc.get_top_n(1000).unwrap().len(), 3);
        assert_eq!(svc.get_top_n(i64::MAX).unwrap().len(), 3);
    }

    #[test]
    fn test_get_player_rank_range() {
        let svc = scenario();
        let window = svc.get_player_rank_range("player1", 1).unwrap();
        assert_eq!(ids(&window), ["player3", "player1", "player2"]);
        let ranks: Vec<i64> = window.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, [1, 2, 3]);

        let only_self = svc.get_player_rank_range("player1", 0).unwrap();
        assert_eq!(ids(&only_self), ["player1"]);

        // Clamped at the top
        let top = svc.get_player_rank_range("player3", 1).unwrap();
        assert_eq!(ids(&top), ["player3", "player1"]);

        // Original demo's window of 2 covers everyone
        assert_eq!(svc.get_player_rank_range("player1", 2).unwrap().len(), 3);
        assert_eq!(svc.get_player_rank_range("player1", i64::MAX).unwrap().len(), 3);
    }

    #[test]
    fn test_negative_window_is_empty() {
        let svc = scenario();
        assert!(svc.get_player_rank_range("player1", -1).unwrap().is_empty());
        assert!(svc.get_player_rank_range("player3", -4).unwrap().is_empty());
        assert!(svc.get_player_rank_range("player2", i64::MIN).unwrap().is_empty());
    }

    #[test]
    fn test_window_for_unknown_player_is_empty() {
        let svc = scenario();
        assert!(svc.get_player_rank_range("unknown_player", 5).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_input_changes_nothing() {
        let svc = scenario();
        let err = svc.update_score("player1", SCORE_LIMIT + 1, 0).unwrap_err();
        assert!(matches!(err, LeaderboardError::InvalidInput(KeyError::InvalidScore(_))));
        let err = svc.update_score("newcomer", 1, TIMESTAMP_LIMIT + 1).unwrap_err();
        assert!(matches!(err, LeaderboardError::InvalidInput(KeyError::InvalidTimestamp(_))));

        assert_eq!(svc.len().unwrap(), 3);
        assert_eq!(svc.get_player_rank("player1").unwrap().score, Some(100));
        assert!(!svc.get_player_rank("newcomer").unwrap().is_ranked());
    }

    #[test]
    fn test_update_replaces_score() {
        let svc = scenario();
        svc.update_score("player2", 151, 1743150269000).unwrap();
        let top = svc.get_top_n(1).unwrap();
        assert_eq!(top[0].player_id, "player2");
        assert_eq!(top[0].score, Some(151));
        assert_eq!(svc.len().unwrap(), 3);
    }

    #[test]
    fn test_update_score_now() {
        let svc = service();
        assert_eq!(svc.update_score_now("p", 10).unwrap(), UpsertOutcome::Inserted);
        assert_eq!(svc.get_player_rank("p").unwrap().score, Some(10));
    }

    #[test]
    fn test_remove_player() {
        let svc = scenario();
        assert!(svc.remove_player("player3").unwrap());
        assert!(!svc.remove_player("player3").unwrap());
        assert_eq!(svc.get_player_rank("player1").unwrap().rank, 1);
        assert_eq!(svc.len().unwrap(), 2);
    }

    #[test]
    fn test_clones_share_index() {
        let svc = service();
        let other = svc.clone();
        other.update_score("p", 5, 5).unwrap();
        assert!(!svc.is_empty().unwrap());
        assert!(Arc::ptr_eq(svc.index(), other.index()));
    }

    #[test]
    fn test_snapshot_and_restore() {
        let svc = scenario();
        let snapshot = svc.snapshot().unwrap();

        let fresh = service();
        fresh.restore(&IndexSnapshot::from_bytes(&snapshot.to_bytes().unwrap()).unwrap()).unwrap();
        assert_eq!(fresh.get_top_n(10).unwrap(), svc.get_top_n(10).unwrap());
        assert_eq!(fresh.snapshot().unwrap().digest(), snapshot.digest());
    }

    #[tokio::test]
    async fn test_shared_across_tasks() {
        let svc = service();
        let mut handles = Vec::new();
        for t in 0..8i64 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..100i64 {
                    svc.update_score(&format!("t{t}-p{}", i % 10), i, t).unwrap();
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(svc.len().unwrap(), 80);
        // Every task's last update had score 90..=99; ties fall to lower timestamp
        let top = svc.get_top_n(1).unwrap();
        assert_eq!(top[0].score, Some(99));
        assert_eq!(top[0].player_id, "t0-p9");
    }
}
