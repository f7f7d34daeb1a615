//! Display-facing rank rows.

use serde::{Deserialize, Serialize};

use crate::index::ranked::RankedPlayer;

/// Rank reported to callers when a player is not on the leaderboard.
pub const UNRANKED: i64 = -1;

/// A player's position as shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankInfo {
    /// 1-based rank, or [`UNRANKED`].
    pub rank: i64,
    /// Current score. `None` for unranked players.
    pub score: Option<i64>,
    /// Player identifier.
    pub player_id: String,
}

impl RankInfo {
    /// Sentinel for a player the leaderboard does not know.
    pub fn unranked(player_id: impl Into<String>) -> Self {
        Self {
            rank: UNRANKED,
            score: None,
            player_id: player_id.into(),
        }
    }

    /// Is this player on the leaderboard?
    pub fn is_ranked(&self) -> bool {
        self.rank != UNRANKED
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<RankedPlayer> for RankInfo {
    fn from(row: RankedPlayer) -> Self {
        Self {
            rank: row.rank as i64 + 1,
            score: Some(row.key.score()),
            player_id: row.player_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::key::encode;
    use crate::index::player::PlayerId;

    #[test]
    fn test_unranked_sentinel() {
        let info = RankInfo::unranked("unknown_player");
        assert_eq!(info.rank, -1);
        assert_eq!(info.score, None);
        assert!(!info.is_ranked());
    }

    #[test]
    fn test_from_row_is_one_based() {
        let info = RankInfo::from(RankedPlayer {
            rank: 0,
            player_id: PlayerId::new("player3"),
            key: encode(150, 1743150268969),
        });
        assert_eq!(info.rank, 1);
        assert_eq!(info.score, Some(150));
        assert!(info.is_ranked());
    }

    #[test]
    fn test_json_shape() {
        let info = RankInfo { rank: 2, score: Some(100), player_id: "player1".to_string() };
        assert_eq!(info.to_json().unwrap(), r#"{"rank":2,"score":100,"player_id":"player1"}"#);
        assert_eq!(
            RankInfo::unranked("x").to_json().unwrap(),
            r#"{"rank":-1,"score":null,"player_id":"x"}"#
        );
    }
}
