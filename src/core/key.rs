//! Composite Ranking Keys
//!
//! Merges a score and a timestamp into one exact, totally ordered integer.
//! All operations use integer arithmetic only - no floats anywhere in ranking.
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  key = score * TIMESTAMP_SCALE - (timestamp + TS_LIMIT)     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  score      : [-2^48, 2^48]        (i64 input)              │
//! │  timestamp  : [-2^44, 2^44]        (i64 millis)             │
//! │  normalized : [0, 2^45]            (< TIMESTAMP_SCALE)      │
//! │  scale      : 2^46                                          │
//! │                                                             │
//! │  |key| < 2^95, stored as i128 (no overflow, no rounding)    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A larger key ranks higher. Score strictly dominates; among equal
//! scores the earlier timestamp produces the larger key.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted score magnitude (inclusive).
pub const SCORE_LIMIT: i64 = 1 << 48;

/// Largest accepted timestamp magnitude (inclusive).
pub const TIMESTAMP_LIMIT: i64 = 1 << 44;

/// Multiplier applied to the score. Must exceed the largest normalized timestamp.
pub const TIMESTAMP_SCALE: i128 = 1 << 46;

/// Input rejected before it reaches the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Score magnitude exceeds [`SCORE_LIMIT`].
    #[error("score {0} outside [-{limit}, {limit}]", limit = SCORE_LIMIT)]
    InvalidScore(i64),
    /// Timestamp magnitude exceeds [`TIMESTAMP_LIMIT`].
    #[error("timestamp {0} outside [-{limit}, {limit}]", limit = TIMESTAMP_LIMIT)]
    InvalidTimestamp(i64),
}

/// Single ordering value for a leaderboard entry.
///
/// Compare keys directly: `a > b` means `a` ranks ahead of `b`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct CompositeKey(i128);

impl CompositeKey {
    /// Wrap a raw key value.
    #[inline]
    pub const fn from_raw(raw: i128) -> Self {
        Self(raw)
    }

    /// Raw key value.
    #[inline]
    pub const fn raw(self) -> i128 {
        self.0
    }

    /// Score component of this key.
    #[inline]
    pub fn score(self) -> i64 {
        decode_score(self)
    }
}

impl fmt::Debug for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompositeKey(score={}, raw={})", self.score(), self.0)
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.score())
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Check that a score is inside the supported range.
#[inline]
pub fn validate_score(score: i64) -> Result<i64, KeyError> {
    if (-SCORE_LIMIT..=SCORE_LIMIT).contains(&score) {
        Ok(score)
    } else {
        Err(KeyError::InvalidScore(score))
    }
}

/// Check that a timestamp is inside the supported range.
#[inline]
pub fn validate_timestamp(timestamp: i64) -> Result<i64, KeyError> {
    if (-TIMESTAMP_LIMIT..=TIMESTAMP_LIMIT).contains(&timestamp) {
        Ok(timestamp)
    } else {
        Err(KeyError::InvalidTimestamp(timestamp))
    }
}

/// Encode a (score, timestamp) pair.
///
/// Callers must validate first; out-of-range input still produces a key
/// but the ordering guarantee no longer holds. Use [`try_encode`] at
/// trust boundaries.
///
/// # Example
/// ```
/// use leaderboard::core::key::encode;
/// assert!(encode(150, 10) > encode(100, 10));
/// assert!(encode(100, 10) > encode(100, 11));
/// ```
#[inline]
pub fn encode(score: i64, timestamp: i64) -> CompositeKey {
    let normalized = timestamp as i128 + TIMESTAMP_LIMIT as i128;
    CompositeKey(score as i128 * TIMESTAMP_SCALE - normalized)
}

/// Validate then encode.
#[inline]
pub fn try_encode(score: i64, timestamp: i64) -> Result<CompositeKey, KeyError> {
    let score = validate_score(score)?;
    let timestamp = validate_timestamp(timestamp)?;
    Ok(encode(score, timestamp))
}

/// Recover the score from a key.
///
/// `key = s * SCALE - n` with `0 <= n < SCALE`, so `s = ceil(key / SCALE)`.
#[inline]
pub fn decode_score(key: CompositeKey) -> i64 {
    -((-key.0).div_euclid(TIMESTAMP_SCALE)) as i64
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_constants() {
        // Normalized timestamps span [0, 2 * TIMESTAMP_LIMIT]
        assert!((2 * TIMESTAMP_LIMIT as i128) < TIMESTAMP_SCALE);
        assert!(SCORE_LIMIT >= 1 << 40);
        assert!(TIMESTAMP_LIMIT >= 1 << 44);
        // Extreme key stays far away from i128 overflow
        let extreme = SCORE_LIMIT as i128 * TIMESTAMP_SCALE + TIMESTAMP_SCALE;
        assert!(extreme < i128::MAX >> 8);
    }

    #[test]
    fn test_score_dominates() {
        assert!(encode(101, TIMESTAMP_LIMIT) > encode(100, -TIMESTAMP_LIMIT));
        assert!(encode(-1, -TIMESTAMP_LIMIT) < encode(0, TIMESTAMP_LIMIT));
    }

    #[test]
    fn test_earlier_timestamp_wins_tie() {
        let early = encode(100, 1743150268969);
        let late = encode(100, 1743150268970);
        assert!(early > late, "earlier achievement must rank higher");
    }

    #[test]
    fn test_equal_pairs_equal_keys() {
        assert_eq!(encode(42, 7), encode(42, 7));
    }

    #[test]
    fn test_decode_score_boundaries() {
        for score in [0, 1, -1, 100, -100, SCORE_LIMIT, -SCORE_LIMIT] {
            for ts in [0, 1, -1, TIMESTAMP_LIMIT, -TIMESTAMP_LIMIT, 1743150268969] {
                assert_eq!(decode_score(encode(score, ts)), score, "score={score} ts={ts}");
            }
        }
    }

    #[test]
    fn test_large_scores_keep_tie_break() {
        // A float encoding collapses these; the fixed-point key must not
        let a = encode(1 << 40, 1743150268969);
        let b = encode(1 << 40, 1743150268970);
        assert!(a > b);
        assert_eq!(a.score(), 1 << 40);
    }

    #[test]
    fn test_validation() {
        assert_eq!(try_encode(SCORE_LIMIT, 0), Ok(encode(SCORE_LIMIT, 0)));
        assert_eq!(try_encode(SCORE_LIMIT + 1, 0), Err(KeyError::InvalidScore(SCORE_LIMIT + 1)));
        assert_eq!(try_encode(i64::MIN, 0), Err(KeyError::InvalidScore(i64::MIN)));
        assert_eq!(
            try_encode(0, TIMESTAMP_LIMIT + 1),
            Err(KeyError::InvalidTimestamp(TIMESTAMP_LIMIT + 1))
        );
        assert_eq!(
            try_encode(0, -TIMESTAMP_LIMIT - 1),
            Err(KeyError::InvalidTimestamp(-TIMESTAMP_LIMIT - 1))
        );
    }

    #[test]
    fn test_score_checked_before_timestamp() {
        assert_eq!(try_encode(i64::MAX, i64::MAX), Err(KeyError::InvalidScore(i64::MAX)));
    }

    fn score_strategy() -> impl Strategy<Value = i64> {
        prop_oneof![
            -SCORE_LIMIT..=SCORE_LIMIT,
            -1000i64..=1000,
            Just(SCORE_LIMIT),
            Just(-SCORE_LIMIT),
        ]
    }

    fn timestamp_strategy() -> impl Strategy<Value = i64> {
        prop_oneof![
            -TIMESTAMP_LIMIT..=TIMESTAMP_LIMIT,
            1743150268000i64..=1743150269000,
            Just(TIMESTAMP_LIMIT),
            Just(-TIMESTAMP_LIMIT),
        ]
    }

    proptest! {
        #[test]
        fn prop_ordering_matches_score_desc_timestamp_asc(
            s1 in score_strategy(),
            t1 in timestamp_strategy(),
            s2 in score_strategy(),
            t2 in timestamp_strategy(),
        ) {
            let expected = s1 > s2 || (s1 == s2 && t1 < t2);
            prop_assert_eq!(encode(s1, t1) > encode(s2, t2), expected);
            prop_assert_eq!(encode(s1, t1) == encode(s2, t2), s1 == s2 && t1 == t2);
        }

        #[test]
        fn prop_decode_recovers_score(s in score_strategy(), t in timestamp_strategy()) {
            prop_assert_eq!(decode_score(encode(s, t)), s);
        }
    }
}
