//! # Leaderboard Index
//!
//! Ranked leaderboard with exact score/recency ordering and logarithmic
//! rank queries, safe to share between threads.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    LEADERBOARD INDEX                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Pure ranking primitives                   │
//! │  ├── key.rs      - Composite (score, timestamp) keys         │
//! │  └── hash.rs     - SHA-256 digests over index contents       │
//! │                                                              │
//! │  index/          - Order-statistics storage                  │
//! │  ├── player.rs   - Player identifiers                        │
//! │  ├── tree.rs     - Size-augmented AVL tree                   │
//! │  ├── ranked.rs   - Locked map + tree, upsert / rank / range  │
//! │  └── snapshot.rs - Serializable copies for persistence       │
//! │                                                              │
//! │  service/        - Public facade                             │
//! │  ├── leaderboard.rs - update / rank / top-N / window         │
//! │  └── rank_info.rs   - 1-based display rows                   │
//! │                                                              │
//! │  config.rs       - Environment-driven settings               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering Guarantee
//!
//! Players are ranked by score descending. Equal scores go to the earlier
//! timestamp; fully equal keys fall back to descending identifier order,
//! as Redis sorted sets do. Keys are exact 128-bit integers, so the order
//! holds for every accepted score and timestamp with no floating-point
//! rounding.
//!
//! ## Example
//!
//! ```
//! use leaderboard::{LeaderboardConfig, LeaderboardService};
//!
//! let board = LeaderboardService::new(&LeaderboardConfig::default());
//! board.update_score("player1", 100, 1743150268969).unwrap();
//! board.update_score("player3", 150, 1743150268969).unwrap();
//! board.update_score("player2", 100, 1743150268970).unwrap();
//!
//! assert_eq!(board.get_player_rank("player1").unwrap().rank, 2);
//! assert_eq!(board.get_player_rank("nobody").unwrap().rank, -1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod index;
pub mod service;

// Re-export commonly used types
pub use crate::config::LeaderboardConfig;
pub use crate::core::key::{CompositeKey, KeyError, encode, decode_score, SCORE_LIMIT, TIMESTAMP_LIMIT};
pub use crate::index::{RankedIndex, PlayerId, IndexError, IndexSnapshot};
pub use crate::service::{LeaderboardService, LeaderboardError, RankInfo};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
