//! Bucket hash functions
//!
//! Chain management in [`crate::ChainMap`] only needs a bucket index for
//! each key. This module isolates that choice behind [`BucketHash`], so the
//! weak reference hash can be swapped for a keyed one without touching the
//! chains.

use crate::siphash::{siphash24, SipKey};

/// Hash function mapping encoded key bytes to a bucket
pub trait BucketHash {
    /// Hash the encoded bytes of one key.
    ///
    /// Any `u64` is acceptable. The map reduces it modulo its bucket count.
    fn hash_bytes(&self, key: &[u8]) -> u64;
}

/// Reference bucket hash: XOR of every key byte
///
/// This is the hash the generated C code has always used, so with the
/// default 64 buckets keys land in the same chains. It is not robust: any
/// two keys with the same multiset of bytes collide (`"ab"` and `"ba"`), and
/// since the result never exceeds 255 a map with more than 256 buckets
/// leaves the rest empty. Use [`SipBucketHash`] when keys may be structured
/// or adversarial.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct XorFold;

impl BucketHash for XorFold {
    #[inline(always)]
    fn hash_bytes(&self, key: &[u8]) -> u64 {
        u64::from(key.iter().fold(0u8, |acc, &b| acc ^ b))
    }
}

/// Keyed SipHash-2-4 bucket hash
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SipBucketHash {
    /// Secret key for every hash computed by this instance
    key: SipKey,
}

impl SipBucketHash {
    /// Hash with an explicit key.
    pub fn new(key: SipKey) -> Self {
        Self { key }
    }

    /// Hash with a key derived from an arbitrary seed.
    pub fn from_seed(seed: &[u8]) -> Self {
        Self::new(SipKey::from_seed(seed))
    }
}

impl BucketHash for SipBucketHash {
    #[inline(always)]
    fn hash_bytes(&self, key: &[u8]) -> u64 {
        siphash24(&self.key, key)
    }
}
