//! Core ranking primitives.
//!
//! Pure, allocation-free building blocks shared by the index and the
//! service facade. Nothing here takes a lock or touches the clock.

pub mod key;
pub mod hash;

// Re-export core types
pub use key::{
    CompositeKey, KeyError, encode, try_encode, decode_score,
    SCORE_LIMIT, TIMESTAMP_LIMIT, TIMESTAMP_SCALE,
};
pub use hash::{IndexDigest, IndexHasher, compute_index_digest};
