//! Ranked Index
//!
//! Order-statistics storage for one leaderboard.
//!
//! ## Module Structure
//!
//! - `player`: Player identifiers
//! - `tree`: Size-augmented AVL tree (rank / select / range)
//! - `ranked`: Locked map + tree with upsert and rank queries
//! - `snapshot`: Serializable copies for external persistence

pub mod player;
pub mod tree;
pub mod ranked;
pub mod snapshot;

use thiserror::Error;

/// Index failures. Both variants mean the index can no longer be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Map and tree disagree.
    #[error("index invariant violated: {0}")]
    InvariantViolation(String),
    /// A writer panicked while holding the lock.
    #[error("index lock poisoned by a panicked writer")]
    Poisoned,
}

// Re-export key types
pub use player::PlayerId;
pub use tree::{OrderTree, TreeEntry, RankRange};
pub use ranked::{RankedIndex, RankPosition, RankedPlayer, UpsertOutcome};
pub use snapshot::{IndexSnapshot, SnapshotEntry, SnapshotError, SNAPSHOT_VERSION};
