//! Key encodings
//!
//! A map hashes and compares keys as byte strings. The [`KeyEncoding`]
//! chosen as a map's type parameter decides how a caller's key turns into
//! those bytes, and it stays fixed for the life of the map.

use bytemuck::Pod;
use std::marker::PhantomData;

/// Conversion from a caller's key to the bytes a map stores and compares
pub trait KeyEncoding {
    /// Key type accepted by map operations, by reference
    type Key: ?Sized;

    /// Borrow the significant bytes of a key.
    fn encode(key: &Self::Key) -> &[u8];
}

/// Fixed-width scalar keys, compared by their native byte representation
///
/// Any plain-old-data type works. Note that floating point keys compare by
/// bit pattern, so `0.0` and `-0.0` are different keys and a NaN can be
/// found again.
pub struct ScalarKey<T: Pod>(PhantomData<T>);

impl<T: Pod> KeyEncoding for ScalarKey<T> {
    type Key = T;

    #[inline(always)]
    fn encode(key: &T) -> &[u8] {
        bytemuck::bytes_of(key)
    }
}

/// Null-terminated byte string keys
///
/// The key ends at its first NUL byte, or at the end of the slice if there
/// is none. A C string passes through unchanged via
/// [`std::ffi::CStr::to_bytes()`], and `b"key\0trailing"` is the same key
/// as `b"key"`.
#[derive(Debug)]
#[non_exhaustive]
pub struct StrKey;

impl KeyEncoding for StrKey {
    type Key = [u8];

    #[inline(always)]
    fn encode(key: &[u8]) -> &[u8] {
        terminated(key)
    }
}

/// Truncate a byte string at its first NUL byte.
#[inline]
pub fn terminated(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}
