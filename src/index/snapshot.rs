//! Index Snapshots
//!
//! Point-in-time copy of a leaderboard's player → key mapping, in rank
//! order. The order tree is never serialized; restore rebuilds it.
//!
//! Encoded with bincode for storage, or JSON for inspection. A SHA-256
//! digest over the entries lets a reader confirm a reload reproduced the
//! same leaderboard.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::hash::{compute_index_digest, IndexDigest};
use crate::core::key::CompositeKey;
use super::player::PlayerId;
use super::IndexError;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u8 = 1;

/// Snapshot errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Unsupported format version.
    #[error("snapshot version {got} not supported (expected {expected})")]
    VersionMismatch {
        /// Version this build writes.
        expected: u8,
        /// Version found in the snapshot.
        got: u8,
    },
    /// Same player listed twice.
    #[error("player {0} appears more than once")]
    DuplicatePlayer(String),
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(String),
    /// Deserialization failed.
    #[error("decode failed: {0}")]
    Decode(String),
    /// Reading or writing the snapshot file failed.
    #[error("snapshot I/O: {0}")]
    Io(#[from] std::io::Error),
    /// The target index could not be updated.
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// One player and the key they held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Player identifier.
    pub player_id: PlayerId,
    /// Key at snapshot time.
    pub key: CompositeKey,
}

/// Serializable copy of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    /// Format version.
    pub version: u8,
    /// Leaderboard name.
    pub name: String,
    /// Wall-clock time the snapshot was taken (Unix millis).
    pub taken_at_ms: i64,
    /// Entries in rank order (highest first).
    pub entries: Vec<SnapshotEntry>,
}

impl IndexSnapshot {
    /// Number of players.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is empty?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Digest over name and entries. Ignores `taken_at_ms`.
    pub fn digest(&self) -> IndexDigest {
        compute_index_digest(
            &self.name,
            self.entries.iter().map(|e| (e.player_id.as_str(), e.key)),
        )
    }

    /// Digest as lowercase hex.
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    /// Deserialize from bincode bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SnapshotError> {
        bincode::deserialize(data).map_err(|e| SnapshotError::Decode(e.to_string()))
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(s).map_err(|e| SnapshotError::Decode(e.to_string()))
    }

    /// Write bincode bytes to a file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Read bincode bytes from a file.
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        Self::from_bytes(&fs::read(path)?)
    }
}
