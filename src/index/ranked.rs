//! Ranked Index
//!
//! Thread-safe leaderboard state: a player → key map for O(1) membership
//! plus an [`OrderTree`] for rank queries. One `RwLock` guards both so a
//! reader never sees a player at two positions or missing mid-move.
//!
//! - Writers (`upsert`, `remove`, `clear`, `restore`) take the write lock.
//! - Readers (`rank_of`, `range_by_rank`, `size`, `snapshot`, ...) share
//!   the read lock.
//!
//! Debug builds, and builds with the `verify-invariants` feature, re-check
//! the whole map against the tree after every write. That makes each write
//! O(n) there; release builds keep writes at O(log n).

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::{debug, error, info};

use crate::core::key::CompositeKey;
use super::player::PlayerId;
use super::snapshot::{IndexSnapshot, SnapshotEntry, SnapshotError, SNAPSHOT_VERSION};
use super::tree::OrderTree;
use super::IndexError;

/// Where a player currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankPosition {
    /// 0-based descending rank (0 = highest key).
    pub rank: usize,
    /// Current key.
    pub key: CompositeKey,
}

/// One row of a rank window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedPlayer {
    /// 0-based descending rank.
    pub rank: usize,
    /// Player identifier.
    pub player_id: PlayerId,
    /// Current key.
    pub key: CompositeKey,
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// New player added.
    Inserted,
    /// Existing player moved from `previous`.
    Moved {
        /// Key before the move.
        previous: CompositeKey,
    },
    /// Player already held this key.
    Unchanged,
}

#[derive(Debug, Default)]
struct IndexState {
    players: HashMap<PlayerId, CompositeKey>,
    tree: OrderTree,
}

impl IndexState {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            players: HashMap::with_capacity(capacity),
            tree: OrderTree::with_capacity(capacity),
        }
    }

    /// Full consistency check between map and tree.
    fn verify(&self) -> Result<(), String> {
        let count = self.tree.check()?;
        if count != self.players.len() {
            return Err(format!(
                "map holds {} players but tree holds {count}",
                self.players.len()
            ));
        }
        for entry in self.tree.iter() {
            match self.players.get(entry.player_id.as_str()) {
                Some(key) if *key == entry.key => {}
                Some(key) => {
                    return Err(format!(
                        "{} mapped to {key:?} but positioned at {:?}",
                        entry.player_id, entry.key
                    ))
                }
                None => return Err(format!("{} in tree but not in map", entry.player_id)),
            }
        }
        Ok(())
    }
}

/// Record and return an invariant violation.
fn violation(name: &str, detail: String) -> IndexError {
    error!(leaderboard = name, "index invariant violated: {}", detail);
    IndexError::InvariantViolation(detail)
}

/// Order-statistics leaderboard index, shareable across threads.
#[derive(Debug)]
pub struct RankedIndex {
    name: String,
    state: RwLock<IndexState>,
}

impl RankedIndex {
    /// Create an empty index.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, 0)
    }

    /// Create an empty index with room for `capacity` players.
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(IndexState::with_capacity(capacity)),
        }
    }

    /// Rebuild an index from a snapshot.
    pub fn from_snapshot(snapshot: &IndexSnapshot) -> Result<Self, SnapshotError> {
        let index = Self::new(snapshot.name.clone());
        index.restore(snapshot)?;
        Ok(index)
    }

    /// Leaderboard name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, IndexState>, IndexError> {
        self.state.read().map_err(|_| {
            error!(leaderboard = %self.name, "index lock poisoned");
            IndexError::Poisoned
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, IndexState>, IndexError> {
        self.state.write().map_err(|_| {
            error!(leaderboard = %self.name, "index lock poisoned");
            IndexError::Poisoned
        })
    }

    #[inline]
    fn check_after_write(&self, state: &IndexState) -> Result<(), IndexError> {
        if cfg!(any(debug_assertions, feature = "verify-invariants")) {
            state.verify().map_err(|detail| violation(&self.name, detail))?;
        }
        Ok(())
    }

    /// Insert a player, or move an existing one to `key`.
    ///
    /// The removal of the old position and the insertion of the new one
    /// happen under a single write lock.
    pub fn upsert(
        &self,
        player_id: impl Into<PlayerId>,
        key: CompositeKey,
    ) -> Result<UpsertOutcome, IndexError> {
        let player_id = player_id.into();
        let mut state = self.write()?;
        let state = &mut *state;

        let outcome = match state.players.get(player_id.as_str()).copied() {
            Some(previous) if previous == key => return Ok(UpsertOutcome::Unchanged),
            Some(previous) => {
                if !state.tree.remove(previous, player_id.as_str()) {
                    return Err(violation(
                        &self.name,
                        format!("{player_id} mapped to {previous:?} but missing from tree"),
                    ));
                }
                UpsertOutcome::Moved { previous }
            }
            None => UpsertOutcome::Inserted,
        };

        if !state.tree.insert(key, &player_id) {
            return Err(violation(
                &self.name,
                format!("{player_id} already positioned at {key:?}"),
            ));
        }
        state.players.insert(player_id.clone(), key);
        self.check_after_write(state)?;

        debug!(leaderboard = %self.name, player = %player_id, score = key.score(), ?outcome, "upsert");
        Ok(outcome)
    }

    /// Remove a player. Returns the key they held, or `None` if absent.
    pub fn remove(&self, player_id: &str) -> Result<Option<CompositeKey>, IndexError> {
        let mut state = self.write()?;
        let state = &mut *state;

        let Some(key) = state.players.get(player_id).copied() else {
            return Ok(None);
        };
        if !state.tree.remove(key, player_id) {
            return Err(violation(
                &self.name,
                format!("{player_id} mapped to {key:?} but missing from tree"),
            ));
        }
        state.players.remove(player_id);
        self.check_after_write(state)?;

        debug!(leaderboard = %self.name, player = player_id, "removed");
        Ok(Some(key))
    }

    /// Drop every player.
    pub fn clear(&self) -> Result<(), IndexError> {
        let mut state = self.write()?;
        state.players.clear();
        state.tree.clear();
        Ok(())
    }

    /// Current rank and key of a player, or `None` if absent.
    pub fn rank_of(&self, player_id: &str) -> Result<Option<RankPosition>, IndexError> {
        let state = self.read()?;
        let Some(&key) = state.players.get(player_id) else {
            return Ok(None);
        };
        match state.tree.rank(key, player_id) {
            Some(rank) => Ok(Some(RankPosition { rank, key })),
            None => Err(violation(
                &self.name,
                format!("{player_id} mapped to {key:?} but missing from tree"),
            )),
        }
    }

    /// Current key of a player.
    pub fn key_of(&self, player_id: &str) -> Result<Option<CompositeKey>, IndexError> {
        Ok(self.read()?.players.get(player_id).copied())
    }

    /// Players whose rank lies in `[start, end]`, highest first.
    ///
    /// Negative `start` is clamped to 0 and `end` to the last rank. Empty
    /// when `start > end` or `start` is past the last rank.
    pub fn range_by_rank(&self, start: i64, end: i64) -> Result<Vec<RankedPlayer>, IndexError> {
        let start = start.max(0);
        if start > end {
            return Ok(Vec::new());
        }
        let state = self.read()?;
        let start = usize::try_from(start).unwrap_or(usize::MAX);
        let end = usize::try_from(end).unwrap_or(usize::MAX);
        let rows = state
            .tree
            .range(start, end)
            .map(|entry| RankedPlayer {
                rank: entry.rank,
                player_id: entry.player_id.clone(),
                key: entry.key,
            })
            .collect();
        Ok(rows)
    }

    /// Number of distinct players.
    pub fn size(&self) -> Result<usize, IndexError> {
        Ok(self.read()?.players.len())
    }

    /// Run the full structural check.
    pub fn verify(&self) -> Result<(), IndexError> {
        let state = self.read()?;
        state.verify().map_err(|detail| violation(&self.name, detail))
    }

    /// Copy the current contents in rank order.
    pub fn snapshot(&self) -> Result<IndexSnapshot, IndexError> {
        let state = self.read()?;
        let entries = state
            .tree
            .iter()
            .map(|entry| SnapshotEntry {
                player_id: entry.player_id.clone(),
                key: entry.key,
            })
            .collect();
        Ok(IndexSnapshot {
            version: SNAPSHOT_VERSION,
            name: self.name.clone(),
            taken_at_ms: Utc::now().timestamp_millis(),
            entries,
        })
    }

    /// Replace the current contents with a snapshot's.
    ///
    /// The new state is built off-lock; the swap is a single write.
    pub fn restore(&self, snapshot: &IndexSnapshot) -> Result<(), SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                got: snapshot.version,
            });
        }

        let mut rebuilt = IndexState::with_capacity(snapshot.entries.len());
        for entry in &snapshot.entries {
            if rebuilt.players.insert(entry.player_id.clone(), entry.key).is_some() {
                return Err(SnapshotError::DuplicatePlayer(entry.player_id.to_string()));
            }
            if !rebuilt.tree.insert(entry.key, &entry.player_id) {
                return Err(violation(
                    &self.name,
                    format!("{} already positioned at {:?}", entry.player_id, entry.key),
                )
                .into());
            }
        }
        rebuilt
            .verify()
            .map_err(|detail| SnapshotError::from(violation(&self.name, detail)))?;

        *self.write()? = rebuilt;
        info!(
            leaderboard = %self.name,
            players = snapshot.entries.len(),
            source = %snapshot.name,
            "restored from snapshot"
        );
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
