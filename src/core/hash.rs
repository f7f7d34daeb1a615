//! Index Digests
//!
//! Deterministic SHA-256 digests over leaderboard contents, used to:
//! - Check that a restored snapshot matches what was saved
//! - Compare two replicas fed the same update stream
//!
//! Strings are length-prefixed so `("ab", "c")` and `("a", "bc")` differ.

use sha2::{Digest, Sha256};

use super::key::CompositeKey;

/// Hash output type (256 bits / 32 bytes)
pub type IndexDigest = [u8; 32];

/// Domain separator for leaderboard contents.
pub const INDEX_DOMAIN: &[u8] = b"LEADERBOARD_INDEX_V1";

/// Deterministic hasher for index contents.
///
/// Order of updates is significant.
pub struct IndexHasher {
    hasher: Sha256,
}

impl IndexHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for leaderboard contents.
    pub fn for_index() -> Self {
        Self::new(INDEX_DOMAIN)
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a length-prefixed string.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u64(value.len() as u64);
        self.hasher.update(value.as_bytes());
    }

    /// Update with a composite key (little-endian i128).
    #[inline]
    pub fn update_key(&mut self, key: CompositeKey) {
        self.hasher.update(key.raw().to_le_bytes());
    }

    /// Update with one ranked entry.
    #[inline]
    pub fn update_entry(&mut self, player_id: &str, key: CompositeKey) {
        self.update_str(player_id);
        self.update_key(key);
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> IndexDigest {
        self.hasher.finalize().into()
    }
}

/// Digest a rank-ordered sequence of entries.
pub fn compute_index_digest<'a, I>(name: &str, entries: I) -> IndexDigest
where
    I: IntoIterator<Item = (&'a str, CompositeKey)>,
{
    let mut hasher = IndexHasher::for_index();
    hasher.update_str(name);
    let mut count = 0u64;
    for (player_id, key) in entries {
        hasher.update_entry(player_id, key);
        count += 1;
    }
    hasher.update_u64(count);
    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================
