//! Bulk vector constructors
//!
//! When the final length is known at the call site, the runtime skips the
//! growth bookkeeping of [`crate::DynArray`] entirely: values are copied
//! into a single exactly-sized allocation and handed back as a boxed slice.
//! The slice length is the only metadata. There's no spare capacity, so
//! these vectors are not meant to grow.
//!
//! [`bulk_vec!`](crate::bulk_vec) takes a variable-length list of values,
//! and [`bulk_array!`](crate::bulk_array) does the same for a
//! [`crate::DynArray`] that starts out full.

use crate::mem;
use crate::Error;

/// Copy `values` into a new exactly-sized vector.
pub fn bulk<T: Copy>(values: &[T]) -> Result<Box<[T]>, Error> {
    mem::try_copy(values)
}

/// Integer vector.
pub fn bulk_ints(values: &[i32]) -> Result<Box<[i32]>, Error> {
    bulk(values)
}

/// Floating point vector.
///
/// Inputs arrive at double precision, the way a variadic call promotes
/// them, and are stored at single precision.
pub fn bulk_floats(values: &[f64]) -> Result<Box<[f32]>, Error> {
    mem::try_collect(values.len(), values.iter().map(|&x| x as f32))
}

/// String vector.
///
/// Only the references are copied. The strings stay owned by the caller.
pub fn bulk_strs<'a>(values: &[&'a str]) -> Result<Box<[&'a str]>, Error> {
    bulk(values)
}

/// Build an exactly-sized boxed slice from a list of values.
///
/// Expands to a call to [`bulk()`], so it evaluates to a
/// `Result<Box<[T]>, Error>`.
///
/// ```
/// let v = waxrt::bulk_vec![3, 1, 4]?;
/// assert_eq!(&*v, &[3, 1, 4]);
/// # Ok::<(), waxrt::Error>(())
/// ```
#[macro_export]
macro_rules! bulk_vec {
    ($($value:expr),* $(,)?) => {
        $crate::vector::bulk(&[$($value),*])
    };
}

/// Build a full [`DynArray`](crate::DynArray) from a list of values.
///
/// The array's capacity equals its length, so the first insert grows it.
///
/// ```
/// let arr = waxrt::bulk_array![1.5f32, 2.5]?;
/// assert_eq!(arr.len(), arr.capacity());
/// # Ok::<(), waxrt::Error>(())
/// ```
#[macro_export]
macro_rules! bulk_array {
    ($($value:expr),* $(,)?) => {
        $crate::DynArray::from_slice(&[$($value),*])
    };
}
