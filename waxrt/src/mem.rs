//! Memory management internals for the runtime containers
//!
//! The containers in this crate report allocation failure to the caller
//! instead of aborting the process. The standard collection types don't give
//! us that for every operation we need (growth to an exact capacity, boxing a
//! single chain node), so this module talks to the global allocator directly.
//!
//! [`RawBuffer`] owns a block of possibly-uninitialized memory with room for
//! some number of `T` items. It knows nothing about which items have been
//! written. That information lives in the owning container, in the same way
//! a bucket count tracks which slots of a bucket have been written. The
//! container must never read a slot it hasn't written.
//!
//! Items are restricted to [`Copy`] types. The buffer never runs destructors
//! for its items, and moving them around with a raw memory copy is always
//! sound.
//!
//! [`try_box`] and [`try_copy`] are the small fallible counterparts of
//! `Box::new` and `<[T]>::into` used for map entries, bulk constructors and
//! the handles of the C ABI.

use crate::Error;
use std::alloc::{self, Layout};
use std::mem;
use std::ptr::{self, NonNull};

/// Compute the [`Layout`] for `cap` items of `T`.
///
/// Overflow of the total size is reported as an allocation failure, since
/// no allocator could satisfy that request anyway.
#[inline]
fn array_layout<T>(cap: usize) -> Result<Layout, Error> {
    Layout::array::<T>(cap).map_err(|_| Error::allocation(cap, mem::size_of::<T>()))
}

/// Exclusively owned block of memory for up to `cap` items of type `T`
///
/// Zero-sized requests, either because `cap` is zero or because `T` is a
/// zero-sized type, never touch the allocator and use a dangling pointer.
pub(crate) struct RawBuffer<T: Copy> {
    /// Start of the block, aligned for `T`
    ptr: NonNull<T>,
    /// Number of `T` slots in the block
    cap: usize,
}

// SAFETY: RawBuffer uniquely owns its allocation, like a Box<[T]>. Sending
//         or sharing it is exactly as safe as sending or sharing the items.
unsafe impl<T: Copy + Send> Send for RawBuffer<T> {}

// SAFETY: Shared access only hands out shared pointers to the items.
unsafe impl<T: Copy + Sync> Sync for RawBuffer<T> {}

impl<T: Copy> RawBuffer<T> {
    /// Allocate a new uninitialized block with room for `cap` items.
    pub(crate) fn allocate(cap: usize) -> Result<Self, Error> {
        let layout = array_layout::<T>(cap)?;
        if layout.size() == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                cap,
            });
        }
        // SAFETY: The layout has a nonzero size, checked above.
        let raw = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(raw.cast::<T>()).ok_or(Error::Allocation {
            requested: layout.size(),
        })?;
        Ok(Self { ptr, cap })
    }

    /// Number of item slots in this block.
    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.cap
    }

    /// Pointer to the first slot, valid for reads of initialized items.
    #[inline(always)]
    pub(crate) fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Pointer to the first slot, valid for reads and writes.
    #[inline(always)]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Change the block's capacity, preserving the contents of the slots
    /// that exist both before and after.
    ///
    /// On failure the existing block is left untouched. On success any
    /// pointer previously obtained from this buffer is invalidated.
    pub(crate) fn resize(&mut self, new_cap: usize) -> Result<(), Error> {
        let old_layout = array_layout::<T>(self.cap)?;
        let new_layout = array_layout::<T>(new_cap)?;

        let raw = match (old_layout.size(), new_layout.size()) {
            (_, 0) => {
                self.release();
                self.ptr = NonNull::dangling();
                self.cap = new_cap;
                return Ok(());
            }
            // SAFETY: The new layout has a nonzero size.
            (0, _) => unsafe { alloc::alloc(new_layout) },
            // SAFETY: The block was allocated by us with `old_layout`, and
            //         the new size is nonzero and was validated by Layout.
            _ => unsafe {
                alloc::realloc(
                    self.ptr.as_ptr().cast::<u8>(),
                    old_layout,
                    new_layout.size(),
                )
            },
        };

        self.ptr = NonNull::new(raw.cast::<T>()).ok_or(Error::Allocation {
            requested: new_layout.size(),
        })?;
        self.cap = new_cap;
        Ok(())
    }

    /// Move `count` items from slot `src` to slot `dst`. The ranges may
    /// overlap.
    ///
    /// # Safety
    ///
    /// Both `src..src + count` and `dst..dst + count` must lie within the
    /// capacity of this buffer.
    #[inline(always)]
    pub(crate) unsafe fn shift(&mut self, src: usize, dst: usize, count: usize) {
        let base = self.as_mut_ptr();
        ptr::copy(base.add(src), base.add(dst), count);
    }

    /// Write one item to a slot.
    ///
    /// # Safety
    ///
    /// `index` must be less than the capacity of this buffer.
    #[inline(always)]
    pub(crate) unsafe fn write(&mut self, index: usize, value: T) {
        self.as_mut_ptr().add(index).write(value);
    }

    /// Return the block to the allocator, if one was allocated.
    fn release(&mut self) {
        if let Ok(layout) = array_layout::<T>(self.cap) {
            if layout.size() != 0 {
                // SAFETY: A nonzero layout means we own a block allocated
                //         with exactly this layout.
                unsafe { alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), layout) }
            }
        }
    }
}

impl<T: Copy> Drop for RawBuffer<T> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Move a value into a new [`Box`], reporting allocation failure.
///
/// Zero-sized values never touch the allocator.
pub fn try_box<T>(value: T) -> Result<Box<T>, Error> {
    let layout = Layout::new::<T>();
    if layout.size() == 0 {
        return Ok(Box::new(value));
    }
    // SAFETY: The layout has a nonzero size, checked above.
    let raw = unsafe { alloc::alloc(layout) }.cast::<T>();
    if raw.is_null() {
        return Err(Error::Allocation {
            requested: layout.size(),
        });
    }
    // SAFETY: `raw` is a fresh allocation with the layout of `T`, which is
    //         what Box expects. We pass its ownership immediately to Box.
    unsafe {
        raw.write(value);
        Ok(Box::from_raw(raw))
    }
}

/// Copy a slice into a new exactly-sized boxed slice, reporting allocation
/// failure.
pub(crate) fn try_copy<T: Copy>(items: &[T]) -> Result<Box<[T]>, Error> {
    try_collect(items.len(), items.iter().copied())
}

/// Collect exactly `len` items from an iterator into a new boxed slice,
/// reporting allocation failure.
///
/// The iterator is expected to produce `len` items. Any extra items are
/// ignored.
pub(crate) fn try_collect<T, I>(len: usize, items: I) -> Result<Box<[T]>, Error>
where
    I: IntoIterator<Item = T>,
{
    let mut vec = Vec::new();
    vec.try_reserve_exact(len)
        .map_err(|_| Error::allocation(len, mem::size_of::<T>()))?;
    vec.extend(items.into_iter().take(len));
    Ok(vec.into_boxed_slice())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resize_keeps_contents() {
        let mut buf = RawBuffer::<u32>::allocate(2).expect("small allocation");
        // SAFETY: Both indices are below the capacity of 2.
        unsafe {
            buf.write(0, 7);
            buf.write(1, 9);
        }
        buf.resize(40).expect("small allocation");
        assert_eq!(buf.capacity(), 40);
        // SAFETY: Slots 0 and 1 were written before the resize.
        let kept = unsafe { std::slice::from_raw_parts(buf.as_ptr(), 2) };
        assert_eq!(kept, &[7, 9]);
    }

    #[test]
    fn zero_sized_requests() {
        let mut buf = RawBuffer::<u64>::allocate(0).expect("no allocation needed");
        assert_eq!(buf.capacity(), 0);
        buf.resize(4).expect("small allocation");
        buf.resize(0).expect("release");
        assert_eq!(buf.capacity(), 0);

        let units = RawBuffer::<()>::allocate(1000).expect("no allocation needed");
        assert_eq!(units.capacity(), 1000);
    }

    #[test]
    fn overflowing_layout() {
        assert!(matches!(
            RawBuffer::<u64>::allocate(usize::MAX),
            Err(Error::Allocation {
                requested: usize::MAX
            })
        ));
    }

    #[test]
    fn exact_copies() {
        let boxed = try_copy(&[1u8, 2, 3]).expect("small allocation");
        assert_eq!(&*boxed, &[1, 2, 3]);
        let empty = try_copy::<u8>(&[]).expect("no allocation needed");
        assert!(empty.is_empty());
        assert_eq!(*try_box(5u16).expect("small allocation"), 5);
    }
}
