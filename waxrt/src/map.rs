//! Chained hash maps with a fixed bucket directory
//!
//! A [`ChainMap`] stores one [`Copy`] payload per key. Keys are turned into
//! bytes by a [`KeyEncoding`], and those bytes are copied into each entry.
//! The bucket directory is allocated once, at construction, and never
//! resized. Each bucket heads a singly linked chain of entries whose keys
//! reduce to that bucket; new keys are prepended.
//!
//! Lookups scan one chain comparing key length and bytes, so with a
//! reasonable hash and key distribution they stay constant time on average.
//! With the default [`XorFold`] hash, structured keys can pile into a few
//! chains. [`ChainMap::stats()`] reports chain lengths so that's visible.

mod hash;
mod key;

pub use hash::{BucketHash, SipBucketHash, XorFold};
pub use key::{terminated, KeyEncoding, ScalarKey, StrKey};

use crate::mem;
use crate::Error;
use std::fmt::{self, Debug, Display};
use std::marker::PhantomData;
use std::num::NonZeroUsize;

/// Number of buckets in a map created with default settings
pub const DEFAULT_BUCKETS: usize = 64;

/// [`DEFAULT_BUCKETS`] as a [`NonZeroUsize`]
const DEFAULT_BUCKETS_NONZERO: NonZeroUsize = match NonZeroUsize::new(DEFAULT_BUCKETS) {
    Some(n) => n,
    None => panic!("default bucket count is nonzero"),
};

/// Map from 64-bit integers to payloads
pub type IntMap<V = u64> = ChainMap<ScalarKey<i64>, V>;

/// Map from null-terminated byte strings to payloads
pub type StrMap<V = u64> = ChainMap<StrKey, V>;

/// One key/payload pair, and the link to the next entry in its chain
struct Entry<V> {
    /// Owned copy of the encoded key bytes
    key: Box<[u8]>,
    /// Caller's payload
    value: V,
    /// Rest of the chain
    next: Link<V>,
}

/// Head of a chain, or the rest of one
type Link<V> = Option<Box<Entry<V>>>;

/// Hash map with chained buckets and owned key bytes
///
/// Type parameters select the key encoding `E`, the payload type `V` (a
/// 64-bit slot by default), and the bucket hash `H`. All three are fixed
/// for the map's lifetime.
pub struct ChainMap<E: KeyEncoding, V: Copy = u64, H: BucketHash = XorFold> {
    /// Fixed directory of chain heads
    buckets: Box<[Link<V>]>,
    /// Number of entries across all chains
    len: usize,
    /// Hash used to pick a bucket for each key
    hasher: H,
    /// The key encoding is a type-level choice only
    encoding: PhantomData<fn() -> E>,
}

impl<E: KeyEncoding, V: Copy> ChainMap<E, V, XorFold> {
    /// Create an empty map with [`DEFAULT_BUCKETS`] buckets and the
    /// reference [`XorFold`] hash.
    pub fn new() -> Result<Self, Error> {
        MapBuilder::new().build()
    }
}

impl<E: KeyEncoding, V: Copy, H: BucketHash> ChainMap<E, V, H> {
    /// Create an empty map with [`DEFAULT_BUCKETS`] buckets and a custom hash.
    pub fn with_hasher(hasher: H) -> Result<Self, Error> {
        MapBuilder::new().build_with_hasher(hasher)
    }

    /// Allocate the bucket directory.
    fn from_parts(num_buckets: NonZeroUsize, hasher: H) -> Result<Self, Error> {
        let num_buckets = num_buckets.get();
        let buckets = mem::try_collect(num_buckets, std::iter::repeat_with(|| None))?;
        Ok(Self {
            buckets,
            len: 0,
            hasher,
            encoding: PhantomData,
        })
    }

    /// Number of entries in the map.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check whether the map holds no entries.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets in the directory.
    #[inline(always)]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Access the bucket hash.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Bucket index that `key` hashes to.
    #[inline]
    pub fn bucket_of(&self, key: &E::Key) -> usize {
        self.bucket_of_bytes(E::encode(key))
    }

    /// Bucket index for already-encoded key bytes.
    ///
    /// Always below the bucket count, whatever the hash returns.
    #[inline(always)]
    fn bucket_of_bytes(&self, bytes: &[u8]) -> usize {
        // The remainder is below buckets.len(), so it fits back in usize.
        (self.hasher.hash_bytes(bytes) % self.buckets.len() as u64) as usize
    }

    /// Iterate over the entries of one chain, starting at its head.
    fn chain(&self, bucket: usize) -> Chain<'_, V> {
        Chain {
            next: self.buckets[bucket].as_deref(),
        }
    }

    /// Find the entry for some encoded key bytes.
    fn find(&self, bytes: &[u8]) -> Option<&Entry<V>> {
        self.chain(self.bucket_of_bytes(bytes))
            .find(|entry| *entry.key == *bytes)
    }

    /// Associate `value` with `key`.
    ///
    /// If the key is already present its payload is replaced in place and
    /// the previous payload is returned. Otherwise a new entry is prepended
    /// to the key's chain. Returns [`Error::Allocation`] if the new entry
    /// can't be allocated, in which case the map is unchanged.
    pub fn set(&mut self, key: &E::Key, value: V) -> Result<Option<V>, Error> {
        let bytes = E::encode(key);
        let bucket = self.bucket_of_bytes(bytes);

        let mut cursor = self.buckets[bucket].as_deref_mut();
        while let Some(entry) = cursor {
            if *entry.key == *bytes {
                return Ok(Some(std::mem::replace(&mut entry.value, value)));
            }
            cursor = entry.next.as_deref_mut();
        }

        let mut entry = mem::try_box(Entry {
            key: mem::try_copy(bytes)?,
            value,
            next: None,
        })?;
        entry.next = self.buckets[bucket].take();
        self.buckets[bucket] = Some(entry);
        self.len += 1;
        Ok(None)
    }

    /// Look up the payload for `key`.
    ///
    /// Returns `None` if there is no entry, which is distinct from an entry
    /// whose payload happens to be zero.
    #[inline]
    pub fn get(&self, key: &E::Key) -> Option<V> {
        self.find(E::encode(key)).map(|entry| entry.value)
    }

    /// Look up the payload for `key`, reporting absence as
    /// [`Error::KeyNotFound`].
    pub fn try_get(&self, key: &E::Key) -> Result<V, Error> {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Look up the payload for `key`, or the default payload if absent.
    ///
    /// With integer payloads a missing key reads as zero.
    pub fn get_or_default(&self, key: &E::Key) -> V
    where
        V: Default,
    {
        self.get(key).unwrap_or_default()
    }

    /// Check whether `key` has an entry.
    pub fn contains_key(&self, key: &E::Key) -> bool {
        self.find(E::encode(key)).is_some()
    }

    /// Remove the entry for `key`, returning its payload.
    ///
    /// Removing a key that isn't present is a no-op and returns `None`.
    pub fn remove(&mut self, key: &E::Key) -> Option<V> {
        let bytes = E::encode(key);
        let bucket = self.bucket_of_bytes(bytes);

        let mut link = &mut self.buckets[bucket];
        while link.as_ref().is_some_and(|entry| *entry.key != *bytes) {
            link = &mut link.as_mut()?.next;
        }
        let mut removed = link.take()?;
        *link = removed.next.take();
        self.len -= 1;
        Some(removed.value)
    }

    /// Remove every entry, keeping the bucket directory.
    pub fn clear(&mut self) {
        for head in self.buckets.iter_mut() {
            // Unlink one node at a time so long chains don't recurse in drop.
            let mut link = head.take();
            while let Some(mut entry) = link {
                link = entry.next.take();
            }
        }
        self.len = 0;
    }

    /// Iterate over every entry as encoded key bytes and payload.
    ///
    /// Entries come out in bucket order, and within a bucket from the most
    /// recently inserted key to the oldest.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            buckets: self.buckets.iter(),
            chain: Chain { next: None },
        }
    }

    /// Measure how entries are spread across the buckets.
    pub fn stats(&self) -> ChainStats {
        let mut stats = ChainStats {
            entries: self.len,
            buckets: self.buckets.len(),
            ..ChainStats::default()
        };
        for bucket in 0..self.buckets.len() {
            let length = self.chain(bucket).count();
            if length > 0 {
                stats.occupied += 1;
            }
            stats.longest_chain = stats.longest_chain.max(length);
        }
        stats
    }
}

impl<E: KeyEncoding, V: Copy, H: BucketHash> Drop for ChainMap<E, V, H> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<E: KeyEncoding, V: Copy + Debug, H: BucketHash> Debug for ChainMap<E, V, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over the entries of a single chain
struct Chain<'a, V> {
    /// Next entry to yield
    next: Option<&'a Entry<V>>,
}

impl<'a, V> Iterator for Chain<'a, V> {
    type Item = &'a Entry<V>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.next?;
        self.next = entry.next.as_deref();
        Some(entry)
    }
}

/// Iterator over every entry of a [`ChainMap`], see [`ChainMap::iter()`]
pub struct Iter<'a, V> {
    /// Buckets whose chains we haven't started yet
    buckets: std::slice::Iter<'a, Link<V>>,
    /// Remainder of the current chain
    chain: Chain<'a, V>,
}

impl<'a, V: Copy> Iterator for Iter<'a, V> {
    type Item = (&'a [u8], V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.chain.next() {
                return Some((&entry.key[..], entry.value));
            }
            self.chain = Chain {
                next: self.buckets.next()?.as_deref(),
            };
        }
    }
}

/// Distribution of entries across a map's buckets
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct ChainStats {
    /// Total number of entries
    pub entries: usize,
    /// Number of buckets in the directory
    pub buckets: usize,
    /// Number of buckets with a non-empty chain
    pub occupied: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
}

impl Display for ChainStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries in {}/{} buckets, longest chain {}",
            self.entries, self.occupied, self.buckets, self.longest_chain
        )
    }
}

/// Builder for creating [`ChainMap`] instances with custom settings
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MapBuilder {
    /// Size of the bucket directory for maps built from here
    buckets: NonZeroUsize,
}

impl MapBuilder {
    /// Create a new [`MapBuilder`] with default settings.
    ///
    /// Immediately calling [`Self::build()`] would be equivalent to using
    /// [`ChainMap::new()`].
    pub fn new() -> Self {
        Self {
            buckets: DEFAULT_BUCKETS_NONZERO,
        }
    }

    /// Select the number of buckets.
    pub fn buckets(&mut self, buckets: NonZeroUsize) -> &mut Self {
        self.buckets = buckets;
        self
    }

    /// Build an empty map with the reference [`XorFold`] hash.
    pub fn build<E: KeyEncoding, V: Copy>(&self) -> Result<ChainMap<E, V, XorFold>, Error> {
        self.build_with_hasher(XorFold)
    }

    /// Build an empty map with a custom hash.
    pub fn build_with_hasher<E: KeyEncoding, V: Copy, H: BucketHash>(
        &self,
        hasher: H,
    ) -> Result<ChainMap<E, V, H>, Error> {
        ChainMap::from_parts(self.buckets, hasher)
    }
}

impl Default for MapBuilder {
    fn default() -> Self {
        Self::new()
    }
}
