//! Service Layer
//!
//! The four public leaderboard operations, plus removal and snapshots.
//! Owns no state beyond a shared handle to the index.

pub mod leaderboard;
pub mod rank_info;

pub use leaderboard::{LeaderboardService, LeaderboardError};
pub use rank_info::{RankInfo, UNRANKED};
