//! Error types for the `waxrt` crate

/// Errors reported by the runtime containers
///
/// Every other condition is defined behavior: setting a key that already
/// exists overwrites its payload, and removing an empty range is a no-op.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The allocator could not provide the requested memory.
    ///
    /// Also reported when a size computation would overflow, in which case
    /// `requested` saturates at [`usize::MAX`].
    #[error("failed to allocate storage for {requested} bytes")]
    Allocation {
        /// Size of the failed request, in bytes
        requested: usize,
    },

    /// An index or range precondition was violated.
    ///
    /// The offending range is `start..end`, which doesn't fit inside a
    /// container of length `len`.
    #[error("range {start}..{end} is out of bounds for length {len}")]
    OutOfRange {
        /// First index of the requested range
        start: usize,
        /// One past the last index of the requested range, saturating
        end: usize,
        /// Length of the container at the time of the request
        len: usize,
    },

    /// A map lookup found no entry for the key.
    ///
    /// Only reported by lookups that need to tell absence apart from a
    /// zero payload, see [`crate::ChainMap::try_get`].
    #[error("no entry for the requested key")]
    KeyNotFound,
}

impl Error {
    /// Build an [`Error::OutOfRange`] for `count` items starting at `start`.
    #[inline]
    pub(crate) fn out_of_range(start: usize, count: usize, len: usize) -> Self {
        Error::OutOfRange {
            start,
            end: start.saturating_add(count),
            len,
        }
    }

    /// Build an [`Error::Allocation`] for `count` items of `size` bytes each.
    #[inline]
    pub(crate) fn allocation(count: usize, size: usize) -> Self {
        Error::Allocation {
            requested: count.saturating_mul(size),
        }
    }
}
