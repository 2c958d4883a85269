//! Growable arrays of fixed-size elements
//!
//! A [`DynArray`] is the runtime's resizable sequence type. It owns a single
//! contiguous buffer, grows by roughly half its capacity whenever an insert
//! finds it full, and supports positional insert and remove by shifting the
//! tail of the buffer. Slicing always copies into a new independent array.
//!
//! Elements are [`Copy`]. The languages this runtime serves only ever store
//! scalars and handles in their arrays, so there is nothing to drop and
//! shifting elements is a plain memory move.

use crate::mem::RawBuffer;
use crate::Error;
use std::fmt::{self, Debug};
use std::ops::Range;
use std::{cmp, slice};

/// Capacity of an array created with [`DynArray::new()`]
pub const DEFAULT_CAPACITY: usize = 16;

/// Smallest number of slots added by one growth step
pub const MIN_GROWTH: usize = 4;

/// Capacity after one growth step from `cap`.
///
/// Adds half the current capacity, but at least [`MIN_GROWTH`] slots.
/// Returns `None` if the new capacity doesn't fit in a `usize`.
#[inline]
pub fn grown_capacity(cap: usize) -> Option<usize> {
    cap.checked_add(cmp::max(MIN_GROWTH, cap / 2))
}

/// Resizable contiguous array with exclusively owned storage
///
/// The first `len` slots of the buffer are initialized, and `len` never
/// exceeds the buffer's capacity. Each array is the only owner of its
/// buffer, so dropping it releases the memory exactly once.
pub struct DynArray<T: Copy> {
    /// Backing storage
    buf: RawBuffer<T>,
    /// Number of initialized items at the front of `buf`
    len: usize,
}

impl<T: Copy> DynArray<T> {
    /// Create an empty array with [`DEFAULT_CAPACITY`] slots.
    pub fn new() -> Result<Self, Error> {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty array with room for `cap` items.
    ///
    /// A capacity of zero is allowed, the first insert will then grow the
    /// array by [`MIN_GROWTH`].
    pub fn with_capacity(cap: usize) -> Result<Self, Error> {
        Ok(Self {
            buf: RawBuffer::allocate(cap)?,
            len: 0,
        })
    }

    /// Create an array holding a copy of `items`, with no spare capacity.
    pub fn from_slice(items: &[T]) -> Result<Self, Error> {
        let mut buf = RawBuffer::allocate(items.len())?;
        // SAFETY: The buffer was just allocated with room for every item,
        //         and it can't overlap with a slice we borrowed.
        unsafe { std::ptr::copy_nonoverlapping(items.as_ptr(), buf.as_mut_ptr(), items.len()) };
        Ok(Self {
            buf,
            len: items.len(),
        })
    }

    /// Number of items in the array.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check whether the array holds no items.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of items the array can hold before it needs to grow.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// View the items as a slice.
    #[inline(always)]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: The first `len` slots are initialized, and the pointer is
        //         non-null and aligned even when nothing was allocated.
        unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len) }
    }

    /// View the items as a mutable slice.
    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: As above, and we hold the only reference to the buffer.
        unsafe { slice::from_raw_parts_mut(self.buf.as_mut_ptr(), self.len) }
    }

    /// Iterate over the items in order.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Raw address of the first item.
    ///
    /// Any insert that grows the array moves its storage, after which this
    /// address must not be used again.
    #[inline(always)]
    pub fn as_ptr(&self) -> *const T {
        self.buf.as_ptr()
    }

    /// Mutable raw address of the first item.
    ///
    /// Invalidated by growth, like [`Self::as_ptr()`].
    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.buf.as_mut_ptr()
    }

    /// Read the item at `index`.
    ///
    /// Returns [`Error::OutOfRange`] unless `index < len`.
    pub fn get(&self, index: usize) -> Result<T, Error> {
        self.as_slice()
            .get(index)
            .copied()
            .ok_or_else(|| Error::out_of_range(index, 1, self.len))
    }

    /// Overwrite the item at `index`.
    ///
    /// Returns [`Error::OutOfRange`] unless `index < len`.
    pub fn set(&mut self, index: usize, value: T) -> Result<(), Error> {
        let len = self.len;
        let slot = self
            .as_mut_slice()
            .get_mut(index)
            .ok_or_else(|| Error::out_of_range(index, 1, len))?;
        *slot = value;
        Ok(())
    }

    /// Insert `value` at `index`, moving every later item one slot toward
    /// the end.
    ///
    /// `index` may equal `len` to append. The array grows first if it is
    /// full, see [`grown_capacity()`]. Returns [`Error::OutOfRange`] if
    /// `index > len`, or [`Error::Allocation`] if growth fails, in which case
    /// the array is unchanged.
    pub fn insert(&mut self, index: usize, value: T) -> Result<(), Error> {
        if index > self.len {
            return Err(Error::out_of_range(index, 0, self.len));
        }
        if self.len == self.buf.capacity() {
            self.grow()?;
        }
        // SAFETY: After growing, `len < capacity`, so both the shifted tail
        //         `index + 1 ..= len` and the written slot are in bounds.
        unsafe {
            self.buf.shift(index, index + 1, self.len - index);
            self.buf.write(index, value);
        }
        self.len += 1;
        Ok(())
    }

    /// Append `value` after the last item.
    pub fn push(&mut self, value: T) -> Result<(), Error> {
        self.insert(self.len, value)
    }

    /// Remove `count` items starting at `index`, moving every later item
    /// down to close the gap.
    ///
    /// Removing zero items is a no-op. Returns [`Error::OutOfRange`] if the
    /// range doesn't fit inside the array, in which case nothing is removed.
    pub fn remove(&mut self, index: usize, count: usize) -> Result<(), Error> {
        let range = self.checked_range(index, count)?;
        // SAFETY: Both the source `end..len` and the destination
        //         `index..len - count` are inside the initialized items.
        unsafe { self.buf.shift(range.end, range.start, self.len - range.end) };
        self.len -= count;
        Ok(())
    }

    /// Copy `count` items starting at `index` into a new array.
    ///
    /// The new array has no spare capacity and shares nothing with `self`.
    /// Returns [`Error::OutOfRange`] if the range doesn't fit.
    pub fn slice(&self, index: usize, count: usize) -> Result<Self, Error> {
        let range = self.checked_range(index, count)?;
        Self::from_slice(&self.as_slice()[range])
    }

    /// Validate `count` items starting at `index` against the current length.
    fn checked_range(&self, index: usize, count: usize) -> Result<Range<usize>, Error> {
        match index.checked_add(count) {
            Some(end) if end <= self.len => Ok(index..end),
            _ => Err(Error::out_of_range(index, count, self.len)),
        }
    }

    /// Enlarge the buffer by one growth step.
    fn grow(&mut self) -> Result<(), Error> {
        let cap = grown_capacity(self.buf.capacity()).ok_or(Error::Allocation {
            requested: usize::MAX,
        })?;
        self.buf.resize(cap)
    }
}

impl<T: Copy + Debug> Debug for DynArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Copy + PartialEq> PartialEq for DynArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Copy + Eq> Eq for DynArray<T> {}

impl<T: Copy> TryFrom<&[T]> for DynArray<T> {
    type Error = Error;

    fn try_from(items: &[T]) -> Result<Self, Error> {
        Self::from_slice(items)
    }
}

impl<'a, T: Copy> IntoIterator for &'a DynArray<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
