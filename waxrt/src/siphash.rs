//! Keyed SipHash for map buckets
//!
//! The reference bucket hash folds key bytes together with XOR, which is
//! fast but clusters badly on structured keys and can be steered by anyone
//! who picks the keys. Maps that hold untrusted keys can use SipHash-2-4
//! instead. This is the standard variable-length construction from the
//! paper, with the usual length byte in the final block.
//!
//! Keys are 128 bits. [`SipKey::from_seed()`] derives one from an arbitrary
//! seed by taking a Blake2s digest, so callers don't have to produce
//! well-distributed key material themselves.
//!
//! SipHash is defined by Jean-Philippe Aumasson and Daniel J. Bernstein in
//! their paper "SipHash: a fast short-input PRF" (2012).

use blake2::{Blake2s256, Digest};
use std::fmt::{self, Debug};

/// 128-bit SipHash key
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct SipKey {
    /// First key word, `k0` in the SipHash paper
    k0: u64,
    /// Second key word, `k1` in the SipHash paper
    k1: u64,
}

impl Debug for SipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material stays out of logs.
        f.write_str("SipKey(..)")
    }
}

impl SipKey {
    /// Size of a key in bytes
    pub const SIZE: usize = 16;

    /// Construct a key from its two 64-bit words.
    #[inline(always)]
    pub fn new(k0: u64, k1: u64) -> Self {
        Self { k0, k1 }
    }

    /// Construct a key from bytes, as two little endian words.
    #[inline(always)]
    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        Self::new(
            u64::from_le_bytes(bytes[0..8].try_into().expect("slice length matches")),
            u64::from_le_bytes(bytes[8..16].try_into().expect("slice length matches")),
        )
    }

    /// Derive a key from a seed of any length.
    ///
    /// Takes the Blake2s-256 digest of the seed and uses its first half.
    pub fn from_seed(seed: &[u8]) -> Self {
        let digest = Blake2s256::digest(seed);
        Self::from_bytes(
            digest[0..Self::SIZE]
                .try_into()
                .expect("slice length matches"),
        )
    }
}

/// Internal state of one SipHash instance
#[derive(Clone, Copy, Eq, PartialEq)]
pub(crate) struct SipState {
    /// State variable V0 as defined in the SipHash paper
    v0: u64,
    /// State variable V1 as defined in the SipHash paper
    v1: u64,
    /// State variable V2 as defined in the SipHash paper
    v2: u64,
    /// State variable V3 as defined in the SipHash paper
    v3: u64,
}

impl Debug for SipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SipState[ {:#018x}, {:#018x}, {:#018x}, {:#018x} ]",
            self.v0, self.v1, self.v2, self.v3
        )
    }
}

impl SipState {
    /// Initialize the state from a key, using the constants from the paper.
    #[inline(always)]
    pub(crate) fn new(key: &SipKey) -> Self {
        Self {
            v0: key.k0 ^ 0x736f_6d65_7073_6575,
            v1: key.k1 ^ 0x646f_7261_6e64_6f6d,
            v2: key.k0 ^ 0x6c79_6765_6e65_7261,
            v3: key.k1 ^ 0x7465_6462_7974_6573,
        }
    }

    /// One `SipRound` as defined in the SipHash paper
    ///
    /// Modifies the `SipState` in-place.
    #[inline(always)]
    pub(crate) fn sip_round(&mut self) {
        self.v0 = self.v0.wrapping_add(self.v1);
        self.v2 = self.v2.wrapping_add(self.v3);
        self.v1 = self.v1.rotate_left(13);
        self.v3 = self.v3.rotate_left(16);
        self.v1 ^= self.v0;
        self.v3 ^= self.v2;
        self.v0 = self.v0.rotate_left(32);

        self.v2 = self.v2.wrapping_add(self.v1);
        self.v0 = self.v0.wrapping_add(self.v3);
        self.v1 = self.v1.rotate_left(17);
        self.v3 = self.v3.rotate_left(21);
        self.v1 ^= self.v2;
        self.v3 ^= self.v0;
        self.v2 = self.v2.rotate_left(32);
    }

    /// Absorb one 64-bit message word with two compression rounds.
    #[inline(always)]
    pub(crate) fn compress(&mut self, word: u64) {
        self.v3 ^= word;
        self.sip_round();
        self.sip_round();
        self.v0 ^= word;
    }

    /// Run the four finalization rounds and produce the output word.
    #[inline(always)]
    pub(crate) fn finish(mut self) -> u64 {
        self.v2 ^= 0xff;
        self.sip_round();
        self.sip_round();
        self.sip_round();
        self.sip_round();
        self.v0 ^ self.v1 ^ self.v2 ^ self.v3
    }
}

/// SipHash-2-4 of a byte string, with 64-bit output
pub fn siphash24(key: &SipKey, data: &[u8]) -> u64 {
    let mut state = SipState::new(key);
    let mut words = data.chunks_exact(8);
    for word in &mut words {
        state.compress(u64::from_le_bytes(
            word.try_into().expect("chunk length matches"),
        ));
    }

    // Final block holds the leftover bytes and the low byte of the length.
    let mut last = [0u8; 8];
    let tail = words.remainder();
    last[..tail.len()].copy_from_slice(tail);
    last[7] = data.len() as u8;
    state.compress(u64::from_le_bytes(last));

    state.finish()
}
