//! C ABI for the waxrt containers
//!
//! Generated C programs link this library and hold containers through
//! opaque handles. Every function that can fail returns a [`Status`], and
//! results come back through out-pointers. Null handles are reported as
//! [`Status::NullHandle`] instead of being dereferenced.
//!
//! Arrays store elements of 4 or 8 bytes. Values cross the boundary as
//! 64-bit slots; 4-byte arrays keep the low half.
//!
//! Strings returned by this library are owned by the caller and released
//! with [`waxrt_str_free`].

// @@ begin lint list maintained by maint/add_warning @@
#![allow(renamed_and_removed_lints)]
#![allow(unknown_lints)]
#![warn(missing_docs)]
#![warn(noop_method_call)]
#![warn(unreachable_pub)]
#![warn(clippy::all)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::cast_lossless)]
#![deny(clippy::checked_conversions)]
#![warn(clippy::cognitive_complexity)]
#![deny(clippy::debug_assert_with_mut_call)]
#![deny(clippy::exhaustive_enums)]
#![deny(clippy::expl_impl_clone_on_copy)]
#![deny(clippy::fallible_impl_from)]
#![deny(clippy::implicit_clone)]
#![deny(clippy::large_stack_arrays)]
#![warn(clippy::manual_ok_or)]
#![deny(clippy::missing_docs_in_private_items)]
#![warn(clippy::needless_borrow)]
#![warn(clippy::needless_pass_by_value)]
#![warn(clippy::option_option)]
#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]
#![warn(clippy::rc_buffer)]
#![deny(clippy::ref_option_ref)]
#![warn(clippy::semicolon_if_nothing_returned)]
#![warn(clippy::trait_duplication_in_bounds)]
#![deny(clippy::unchecked_duration_subtraction)]
#![deny(clippy::unnecessary_wraps)]
#![warn(clippy::unseparated_literal_suffix)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::mod_module_files)]
#![allow(clippy::let_unit_value)] // This can reasonably be done for explicitness
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::needless_raw_string_hashes)] // complained-about code is fine, often best
#![allow(clippy::needless_lifetimes)]
//! <!-- @@ end lint list maintained by maint/add_warning @@ -->

use bytemuck::{Pod, Zeroable};
use std::ffi::{c_char, c_int, c_void, CStr};
use waxrt::{bits, text, try_box, vector, DynArray, Error, IntMap, StrMap};

/// Result code of an FFI call
#[repr(i32)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Status {
    /// The call succeeded
    Ok = 0,
    /// Memory could not be allocated
    Allocation = 1,
    /// An index or range was outside the container
    OutOfRange = 2,
    /// A map lookup found no entry
    KeyNotFound = 3,
    /// A handle or pointer argument was null
    NullHandle = 4,
    /// The element width or key kind doesn't match the container
    BadKind = 5,
    /// Any other runtime error
    Other = -1,
}

impl From<&Error> for Status {
    fn from(err: &Error) -> Self {
        match err {
            Error::Allocation { .. } => Status::Allocation,
            Error::OutOfRange { .. } => Status::OutOfRange,
            Error::KeyNotFound => Status::KeyNotFound,
            _ => Status::Other,
        }
    }
}

impl<T> From<Result<T, Error>> for Status {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(_) => Status::Ok,
            Err(err) => Status::from(&err),
        }
    }
}

/// Array handle, sized by element width
#[non_exhaustive]
pub enum WaxArray {
    /// 4-byte elements
    Narrow(DynArray<u32>),
    /// 8-byte elements
    Wide(DynArray<u64>),
}

impl WaxArray {
    /// Number of elements.
    fn len(&self) -> usize {
        match self {
            WaxArray::Narrow(a) => a.len(),
            WaxArray::Wide(a) => a.len(),
        }
    }

    /// Number of element slots allocated.
    fn capacity(&self) -> usize {
        match self {
            WaxArray::Narrow(a) => a.capacity(),
            WaxArray::Wide(a) => a.capacity(),
        }
    }

    /// Read one element, widened to a 64-bit slot.
    fn get(&self, index: usize) -> Result<u64, Error> {
        match self {
            WaxArray::Narrow(a) => a.get(index).map(u64::from),
            WaxArray::Wide(a) => a.get(index),
        }
    }

    /// Overwrite one element. Narrow arrays keep the low half of `value`.
    fn set(&mut self, index: usize, value: u64) -> Result<(), Error> {
        match self {
            WaxArray::Narrow(a) => a.set(index, value as u32),
            WaxArray::Wide(a) => a.set(index, value),
        }
    }

    /// Insert one element, truncated like [`WaxArray::set`].
    fn insert(&mut self, index: usize, value: u64) -> Result<(), Error> {
        match self {
            WaxArray::Narrow(a) => a.insert(index, value as u32),
            WaxArray::Wide(a) => a.insert(index, value),
        }
    }

    /// Remove a run of elements.
    fn remove(&mut self, index: usize, count: usize) -> Result<(), Error> {
        match self {
            WaxArray::Narrow(a) => a.remove(index, count),
            WaxArray::Wide(a) => a.remove(index, count),
        }
    }

    /// Copy a run of elements into a new array of the same width.
    fn slice(&self, index: usize, count: usize) -> Result<Self, Error> {
        Ok(match self {
            WaxArray::Narrow(a) => WaxArray::Narrow(a.slice(index, count)?),
            WaxArray::Wide(a) => WaxArray::Wide(a.slice(index, count)?),
        })
    }

    /// Untyped address of the first element.
    fn data(&mut self) -> *mut c_void {
        match self {
            WaxArray::Narrow(a) => a.as_mut_ptr().cast(),
            WaxArray::Wide(a) => a.as_mut_ptr().cast(),
        }
    }
}

/// Map handle, keyed by integers or by C strings
#[non_exhaustive]
pub enum WaxMap {
    /// 64-bit integer keys
    Int(IntMap<i64>),
    /// Null-terminated string keys
    Str(StrMap<i64>),
}

/// Distribution of a map's entries, see [`waxrt::ChainStats`]
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct WaxMapStats {
    /// Number of entries
    pub entries: u64,
    /// Number of buckets
    pub buckets: u64,
    /// Number of non-empty buckets
    pub occupied: u64,
    /// Length of the longest chain
    pub longest_chain: u64,
}

impl WaxMapStats {
    /// View the stats as raw bytes, in native endianness.
    pub fn to_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Move a container into a heap handle for C, or null if either the
/// container or its handle couldn't be allocated.
fn into_handle<T>(value: Result<T, Error>) -> *mut T {
    match value.and_then(try_box) {
        Ok(handle) => Box::into_raw(handle),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Fill an array whose capacity is exactly its length.
fn filled<T: Copy>(values: impl ExactSizeIterator<Item = T>) -> Result<DynArray<T>, Error> {
    let mut arr = DynArray::with_capacity(values.len())?;
    for value in values {
        arr.push(value)?;
    }
    Ok(arr)
}

/// Create an array with elements of `elem_size` bytes.
///
/// Returns null if `elem_size` is not 4 or 8, or if allocation fails.
#[no_mangle]
pub extern "C" fn waxrt_arr_new(elem_size: usize) -> *mut WaxArray {
    match elem_size {
        4 => into_handle(DynArray::new().map(WaxArray::Narrow)),
        8 => into_handle(DynArray::new().map(WaxArray::Wide)),
        _ => std::ptr::null_mut(),
    }
}

/// Create a full array of 4-byte integers copied from `values`.
///
/// Length and capacity both equal `count`. Returns null if `values` is null
/// with a nonzero `count`, or if allocation fails.
///
/// # Safety
///
/// `values` must be null or valid for `count` reads.
#[no_mangle]
pub unsafe extern "C" fn waxrt_arr_new_ints(count: usize, values: *const i32) -> *mut WaxArray {
    // SAFETY: Forwarded from the caller.
    match unsafe { c_slice(values, count) } {
        Some(ints) => {
            let bits = bytemuck::cast_slice::<i32, u32>(ints);
            into_handle(DynArray::from_slice(bits).map(WaxArray::Narrow))
        }
        None => std::ptr::null_mut(),
    }
}

/// Create a full array of floats, narrowed from the doubles in `values`.
///
/// Elements are stored as 4-byte float bits. Returns null as for
/// [`waxrt_arr_new_ints`].
///
/// # Safety
///
/// `values` must be null or valid for `count` reads.
#[no_mangle]
pub unsafe extern "C" fn waxrt_arr_new_flts(count: usize, values: *const f64) -> *mut WaxArray {
    // SAFETY: Forwarded from the caller.
    match unsafe { c_slice(values, count) } {
        Some(flts) => into_handle(
            filled(flts.iter().map(|&x| (x as f32).to_bits())).map(WaxArray::Narrow),
        ),
        None => std::ptr::null_mut(),
    }
}

/// Create a full array of string pointers copied from `values`.
///
/// Only the pointers are stored; the strings stay owned by the caller.
/// Elements are pointer-sized. Returns null as for [`waxrt_arr_new_ints`].
///
/// # Safety
///
/// `values` must be null or valid for `count` reads.
#[no_mangle]
pub unsafe extern "C" fn waxrt_arr_new_strs(
    count: usize,
    values: *const *const c_char,
) -> *mut WaxArray {
    // SAFETY: Forwarded from the caller.
    let Some(strs) = (unsafe { c_slice(values, count) }) else {
        return std::ptr::null_mut();
    };
    let addrs = strs.iter().map(|&s| s as usize);
    if std::mem::size_of::<usize>() == 8 {
        into_handle(filled(addrs.map(|a| a as u64)).map(WaxArray::Wide))
    } else {
        into_handle(filled(addrs.map(|a| a as u32)).map(WaxArray::Narrow))
    }
}

/// Number of elements in `arr`, or zero for a null handle.
///
/// # Safety
///
/// `arr` must be null or a live handle from this library.
#[no_mangle]
pub unsafe extern "C" fn waxrt_arr_len(arr: *const WaxArray) -> usize {
    // SAFETY: Caller guarantees the handle is null or live.
    unsafe { arr.as_ref() }.map_or(0, WaxArray::len)
}

/// Capacity of `arr`, or zero for a null handle.
///
/// # Safety
///
/// `arr` must be null or a live handle from this library.
#[no_mangle]
pub unsafe extern "C" fn waxrt_arr_cap(arr: *const WaxArray) -> usize {
    // SAFETY: Caller guarantees the handle is null or live.
    unsafe { arr.as_ref() }.map_or(0, WaxArray::capacity)
}

/// Address of the first element, or null for a null handle.
///
/// The address is invalidated by any insert that grows the array.
///
/// # Safety
///
/// `arr` must be null or a live handle from this library.
#[no_mangle]
pub unsafe extern "C" fn waxrt_arr_data(arr: *mut WaxArray) -> *mut c_void {
    // SAFETY: Caller guarantees the handle is null or live.
    unsafe { arr.as_mut() }.map_or(std::ptr::null_mut(), WaxArray::data)
}

/// Read the element at `index` into `out`.
///
/// # Safety
///
/// `arr` must be null or a live handle, and `out` must be null or valid
/// for a write.
#[no_mangle]
pub unsafe extern "C" fn waxrt_arr_get(
    arr: *const WaxArray,
    index: usize,
    out: *mut u64,
) -> Status {
    // SAFETY: Caller guarantees both pointers are null or valid.
    let (Some(arr), Some(out)) = (unsafe { arr.as_ref() }, unsafe { out.as_mut() }) else {
        return Status::NullHandle;
    };
    match arr.get(index) {
        Ok(value) => {
            *out = value;
            Status::Ok
        }
        Err(err) => Status::from(&err),
    }
}

/// Overwrite the element at `index`.
///
/// # Safety
///
/// `arr` must be null or a live handle from this library.
#[no_mangle]
pub unsafe extern "C" fn waxrt_arr_set(arr: *mut WaxArray, index: usize, value: u64) -> Status {
    // SAFETY: Caller guarantees the handle is null or live.
    match unsafe { arr.as_mut() } {
        Some(arr) => arr.set(index, value).into(),
        None => Status::NullHandle,
    }
}

/// Insert `value` at `index`, growing the array if it's full.
///
/// # Safety
///
/// `arr` must be null or a live handle from this library.
#[no_mangle]
pub unsafe extern "C" fn waxrt_arr_insert(arr: *mut WaxArray, index: usize, value: u64) -> Status {
    // SAFETY: Caller guarantees the handle is null or live.
    match unsafe { arr.as_mut() } {
        Some(arr) => arr.insert(index, value).into(),
        None => Status::NullHandle,
    }
}

/// Remove `count` elements starting at `index`.
///
/// # Safety
///
/// `arr` must be null or a live handle from this library.
#[no_mangle]
pub unsafe extern "C" fn waxrt_arr_remove(
    arr: *mut WaxArray,
    index: usize,
    count: usize,
) -> Status {
    // SAFETY: Caller guarantees the handle is null or live.
    match unsafe { arr.as_mut() } {
        Some(arr) => arr.remove(index, count).into(),
        None => Status::NullHandle,
    }
}

/// Copy `count` elements starting at `index` into a new array, stored
/// through `out`.
///
/// # Safety
///
/// `arr` must be null or a live handle, and `out` must be null or valid
/// for a write.
#[no_mangle]
pub unsafe extern "C" fn waxrt_arr_slice(
    arr: *const WaxArray,
    index: usize,
    count: usize,
    out: *mut *mut WaxArray,
) -> Status {
    // SAFETY: Caller guarantees both pointers are null or valid.
    let (Some(arr), Some(out)) = (unsafe { arr.as_ref() }, unsafe { out.as_mut() }) else {
        return Status::NullHandle;
    };
    match arr.slice(index, count).and_then(try_box) {
        Ok(part) => {
            *out = Box::into_raw(part);
            Status::Ok
        }
        Err(err) => Status::from(&err),
    }
}

/// Release an array. Null is ignored.
///
/// # Safety
///
/// `arr` must be null or a live handle, and must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn waxrt_arr_free(arr: *mut WaxArray) {
    if !arr.is_null() {
        // SAFETY: Live handles come from Box::into_raw and are freed once.
        drop(unsafe { Box::from_raw(arr) });
    }
}

/// Create a map with integer keys, or C string keys if `str_keys` is
/// nonzero.
///
/// Returns null if allocation fails.
#[no_mangle]
pub extern "C" fn waxrt_map_new(str_keys: c_char) -> *mut WaxMap {
    if str_keys != 0 {
        into_handle(StrMap::new().map(WaxMap::Str))
    } else {
        into_handle(IntMap::new().map(WaxMap::Int))
    }
}

/// Number of entries in `map`, or zero for a null handle.
///
/// # Safety
///
/// `map` must be null or a live handle from this library.
#[no_mangle]
pub unsafe extern "C" fn waxrt_map_len(map: *const WaxMap) -> usize {
    // SAFETY: Caller guarantees the handle is null or live.
    match unsafe { map.as_ref() } {
        Some(WaxMap::Int(m)) => m.len(),
        Some(WaxMap::Str(m)) => m.len(),
        None => 0,
    }
}

/// Bucket distribution of `map`, all zero for a null handle.
///
/// # Safety
///
/// `map` must be null or a live handle from this library.
#[no_mangle]
pub unsafe extern "C" fn waxrt_map_stats(map: *const WaxMap) -> WaxMapStats {
    // SAFETY: Caller guarantees the handle is null or live.
    let stats = match unsafe { map.as_ref() } {
        Some(WaxMap::Int(m)) => m.stats(),
        Some(WaxMap::Str(m)) => m.stats(),
        None => return WaxMapStats::zeroed(),
    };
    WaxMapStats {
        entries: stats.entries as u64,
        buckets: stats.buckets as u64,
        occupied: stats.occupied as u64,
        longest_chain: stats.longest_chain as u64,
    }
}

/// Key argument resolved against the map's key kind
enum KeyRef<'a> {
    /// Integer key
    Int(i64),
    /// Bytes of a C string, without the terminator
    Str(&'a [u8]),
}

/// Run `f` on a map and a key of the matching kind.
fn with_key<R>(
    map: Option<&mut WaxMap>,
    key: KeyRef<'_>,
    f: impl FnOnce(&mut WaxMap, KeyRef<'_>) -> R,
) -> Result<R, Status> {
    let map = map.ok_or(Status::NullHandle)?;
    match (&*map, &key) {
        (WaxMap::Int(_), KeyRef::Int(_)) | (WaxMap::Str(_), KeyRef::Str(_)) => Ok(f(map, key)),
        _ => Err(Status::BadKind),
    }
}

/// Borrow the bytes of a C string, or `None` if the pointer is null.
///
/// # Safety
///
/// `key` must be null or point to a null-terminated string that outlives
/// the returned slice.
unsafe fn c_key<'a>(key: *const c_char) -> Option<&'a [u8]> {
    if key.is_null() {
        None
    } else {
        // SAFETY: Caller guarantees a valid, terminated string.
        Some(unsafe { CStr::from_ptr(key) }.to_bytes())
    }
}

/// Associate `value` with a key.
fn map_set(map: &mut WaxMap, key: KeyRef<'_>, value: i64) -> Status {
    match (map, key) {
        (WaxMap::Int(m), KeyRef::Int(k)) => m.set(&k, value).into(),
        (WaxMap::Str(m), KeyRef::Str(k)) => m.set(k, value).into(),
        _ => Status::BadKind,
    }
}

/// Look up a key.
fn map_get(map: &mut WaxMap, key: KeyRef<'_>) -> Option<i64> {
    match (map, key) {
        (WaxMap::Int(m), KeyRef::Int(k)) => m.get(&k),
        (WaxMap::Str(m), KeyRef::Str(k)) => m.get(k),
        _ => None,
    }
}

/// Remove a key.
fn map_remove(map: &mut WaxMap, key: KeyRef<'_>) -> Option<i64> {
    match (map, key) {
        (WaxMap::Int(m), KeyRef::Int(k)) => m.remove(&k),
        (WaxMap::Str(m), KeyRef::Str(k)) => m.remove(k),
        _ => None,
    }
}

/// Store a lookup result through `out`.
fn lookup_status(found: Result<Option<i64>, Status>, out: Option<&mut i64>) -> Status {
    match found {
        Ok(Some(value)) => {
            if let Some(out) = out {
                *out = value;
            }
            Status::Ok
        }
        Ok(None) => Status::KeyNotFound,
        Err(status) => status,
    }
}

/// Set an integer key.
///
/// # Safety
///
/// `map` must be null or a live handle from this library.
#[no_mangle]
pub unsafe extern "C" fn waxrt_map_set_int(map: *mut WaxMap, key: i64, value: i64) -> Status {
    // SAFETY: Caller guarantees the handle is null or live.
    let map = unsafe { map.as_mut() };
    with_key(map, KeyRef::Int(key), |m, k| map_set(m, k, value)).unwrap_or_else(|s| s)
}

/// Set a string key. The key bytes are copied.
///
/// # Safety
///
/// `map` must be null or a live handle, and `key` must be null or a
/// null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn waxrt_map_set_str(
    map: *mut WaxMap,
    key: *const c_char,
    value: i64,
) -> Status {
    // SAFETY: Caller guarantees both pointers are null or valid.
    let (map, Some(key)) = (unsafe { map.as_mut() }, unsafe { c_key(key) }) else {
        return Status::NullHandle;
    };
    with_key(map, KeyRef::Str(key), |m, k| map_set(m, k, value)).unwrap_or_else(|s| s)
}

/// Look up an integer key, storing its payload through `out`.
///
/// Returns [`Status::KeyNotFound`] without touching `out` if the key is
/// absent. `out` may be null to only test for presence.
///
/// # Safety
///
/// `map` must be null or a live handle, and `out` must be null or valid
/// for a write.
#[no_mangle]
pub unsafe extern "C" fn waxrt_map_get_int(map: *mut WaxMap, key: i64, out: *mut i64) -> Status {
    // SAFETY: Caller guarantees both pointers are null or valid.
    let (map, out) = (unsafe { map.as_mut() }, unsafe { out.as_mut() });
    lookup_status(with_key(map, KeyRef::Int(key), map_get), out)
}

/// Look up a string key, storing its payload through `out`.
///
/// # Safety
///
/// As for [`waxrt_map_get_int`], and `key` must be null or a
/// null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn waxrt_map_get_str(
    map: *mut WaxMap,
    key: *const c_char,
    out: *mut i64,
) -> Status {
    // SAFETY: Caller guarantees every pointer is null or valid.
    let (map, Some(key), out) = (unsafe { map.as_mut() }, unsafe { c_key(key) }, unsafe {
        out.as_mut()
    }) else {
        return Status::NullHandle;
    };
    lookup_status(with_key(map, KeyRef::Str(key), map_get), out)
}

/// Look up an integer key, returning zero if it's absent.
///
/// # Safety
///
/// `map` must be null or a live handle from this library.
#[no_mangle]
pub unsafe extern "C" fn waxrt_map_get_int_or_zero(map: *mut WaxMap, key: i64) -> i64 {
    // SAFETY: Caller guarantees the handle is null or live.
    let map = unsafe { map.as_mut() };
    with_key(map, KeyRef::Int(key), map_get)
        .ok()
        .flatten()
        .unwrap_or(0)
}

/// Look up a string key, returning zero if it's absent.
///
/// # Safety
///
/// `map` must be null or a live handle, and `key` must be null or a
/// null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn waxrt_map_get_str_or_zero(map: *mut WaxMap, key: *const c_char) -> i64 {
    // SAFETY: Caller guarantees both pointers are null or valid.
    let (map, Some(key)) = (unsafe { map.as_mut() }, unsafe { c_key(key) }) else {
        return 0;
    };
    with_key(map, KeyRef::Str(key), map_get)
        .ok()
        .flatten()
        .unwrap_or(0)
}

/// Remove an integer key. Absent keys are a no-op.
///
/// # Safety
///
/// `map` must be null or a live handle from this library.
#[no_mangle]
pub unsafe extern "C" fn waxrt_map_remove_int(map: *mut WaxMap, key: i64) -> Status {
    // SAFETY: Caller guarantees the handle is null or live.
    let map = unsafe { map.as_mut() };
    match with_key(map, KeyRef::Int(key), map_remove) {
        Ok(_) => Status::Ok,
        Err(status) => status,
    }
}

/// Remove a string key. Absent keys are a no-op.
///
/// # Safety
///
/// `map` must be null or a live handle, and `key` must be null or a
/// null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn waxrt_map_remove_str(map: *mut WaxMap, key: *const c_char) -> Status {
    // SAFETY: Caller guarantees both pointers are null or valid.
    let (map, Some(key)) = (unsafe { map.as_mut() }, unsafe { c_key(key) }) else {
        return Status::NullHandle;
    };
    match with_key(map, KeyRef::Str(key), map_remove) {
        Ok(_) => Status::Ok,
        Err(status) => status,
    }
}

/// Release a map and every key it owns. Null is ignored.
///
/// # Safety
///
/// `map` must be null or a live handle, and must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn waxrt_map_free(map: *mut WaxMap) {
    if !map.is_null() {
        // SAFETY: Live handles come from Box::into_raw and are freed once.
        drop(unsafe { Box::from_raw(map) });
    }
}

/// Hand an exactly-sized vector to C as a bare pointer.
fn leak_vec<T>(values: Result<Box<[T]>, Error>) -> *mut T {
    match values {
        Ok(values) => Box::into_raw(values).cast(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Take back a vector from [`leak_vec`].
///
/// # Safety
///
/// `ptr` and `len` must describe a vector from [`leak_vec`] that has not
/// been freed.
unsafe fn free_vec<T>(ptr: *mut T, len: usize) {
    if !ptr.is_null() {
        // SAFETY: Caller guarantees this is a leaked boxed slice of `len`.
        drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)) });
    }
}

/// Borrow `count` items from C.
///
/// A zero count is always empty. A null pointer with a nonzero count
/// returns `None`.
///
/// # Safety
///
/// `ptr` must be null or valid for `count` reads.
unsafe fn c_slice<'a, T>(ptr: *const T, count: usize) -> Option<&'a [T]> {
    if count == 0 {
        Some(&[])
    } else if ptr.is_null() {
        None
    } else {
        // SAFETY: Caller guarantees `count` readable items.
        Some(unsafe { std::slice::from_raw_parts(ptr, count) })
    }
}

/// Copy `count` integers into a new vector.
///
/// Returns null if `values` is null with a nonzero `count`, or if
/// allocation fails. Free with [`waxrt_vec_free_ints`].
///
/// # Safety
///
/// `values` must be null or valid for `count` reads.
#[no_mangle]
pub unsafe extern "C" fn waxrt_vec_new_ints(count: usize, values: *const i32) -> *mut i32 {
    // SAFETY: Forwarded from the caller.
    unsafe { c_slice(values, count) }.map_or(std::ptr::null_mut(), |ints| {
        leak_vec(vector::bulk_ints(ints))
    })
}

/// Narrow `count` doubles into a new vector of floats.
///
/// Returns null as for [`waxrt_vec_new_ints`]. Free with
/// [`waxrt_vec_free_flts`].
///
/// # Safety
///
/// `values` must be null or valid for `count` reads.
#[no_mangle]
pub unsafe extern "C" fn waxrt_vec_new_flts(count: usize, values: *const f64) -> *mut f32 {
    // SAFETY: Forwarded from the caller.
    unsafe { c_slice(values, count) }.map_or(std::ptr::null_mut(), |flts| {
        leak_vec(vector::bulk_floats(flts))
    })
}

/// Copy `count` string pointers into a new vector.
///
/// The strings themselves are not copied. Returns null as for
/// [`waxrt_vec_new_ints`]. Free with [`waxrt_vec_free_strs`].
///
/// # Safety
///
/// `values` must be null or valid for `count` reads.
#[no_mangle]
pub unsafe extern "C" fn waxrt_vec_new_strs(
    count: usize,
    values: *const *const c_char,
) -> *mut *const c_char {
    // SAFETY: Forwarded from the caller.
    unsafe { c_slice(values, count) }.map_or(std::ptr::null_mut(), |strs| {
        leak_vec(vector::bulk(strs))
    })
}

/// Release an integer vector. Null is ignored.
///
/// # Safety
///
/// `vec` must come from [`waxrt_vec_new_ints`] with the same `count`.
#[no_mangle]
pub unsafe extern "C" fn waxrt_vec_free_ints(vec: *mut i32, count: usize) {
    // SAFETY: Forwarded from the caller.
    unsafe { free_vec(vec, count) }
}

/// Release a float vector. Null is ignored.
///
/// # Safety
///
/// `vec` must come from [`waxrt_vec_new_flts`] with the same `count`.
#[no_mangle]
pub unsafe extern "C" fn waxrt_vec_free_flts(vec: *mut f32, count: usize) {
    // SAFETY: Forwarded from the caller.
    unsafe { free_vec(vec, count) }
}

/// Release a string pointer vector, but not the strings. Null is ignored.
///
/// # Safety
///
/// `vec` must come from [`waxrt_vec_new_strs`] with the same `count`.
#[no_mangle]
pub unsafe extern "C" fn waxrt_vec_free_strs(vec: *mut *const c_char, count: usize) {
    // SAFETY: Forwarded from the caller.
    unsafe { free_vec(vec, count) }
}

/// Reinterpret the bits of a float as an integer.
#[no_mangle]
pub extern "C" fn waxrt_reinterp_f2i(x: f32) -> i32 {
    bits::f32_to_bits(x)
}

/// Reinterpret the bits of an integer as a float.
#[no_mangle]
pub extern "C" fn waxrt_reinterp_i2f(x: i32) -> f32 {
    bits::f32_from_bits(x)
}

/// Number rendered into a fixed 32-byte, null-terminated buffer
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct WaxShortStr {
    /// Rendered text, padded with NUL bytes
    pub data: [u8; 32],
}

impl WaxShortStr {
    /// The rendered text, without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        let len = self.data.iter().position(|&b| b == 0).unwrap_or(self.data.len());
        &self.data[..len]
    }
}

impl From<&text::ShortStr> for WaxShortStr {
    fn from(s: &text::ShortStr) -> Self {
        let mut out = WaxShortStr::zeroed();
        // Keep the last byte as a terminator
        let len = s.len().min(out.data.len() - 1);
        out.data[..len].copy_from_slice(&s.as_bytes()[..len]);
        out
    }
}

/// Render an integer in decimal.
#[no_mangle]
pub extern "C" fn waxrt_int2str(x: i32) -> WaxShortStr {
    WaxShortStr::from(&text::int_to_short(x))
}

/// Render a float like C's `%g`.
#[no_mangle]
pub extern "C" fn waxrt_flt2str(x: f32) -> WaxShortStr {
    WaxShortStr::from(&text::float_to_short(x))
}

/// Hand a byte string to C as an owned, null-terminated string.
///
/// `bytes` must not contain a NUL, so that [`waxrt_str_free`] can recover
/// the allocation size from the string length.
fn leak_str(bytes: Result<Vec<u8>, Error>) -> Result<*mut c_char, Error> {
    let mut bytes = bytes?;
    text::concat(&mut bytes, b"\0")?;
    Ok(Box::into_raw(bytes.into_boxed_slice()).cast())
}

/// Replace the owned string at `s` with `f` applied to its bytes.
///
/// The old string is only released once the new one exists, so on failure
/// `*s` is left as it was.
///
/// # Safety
///
/// `s` must be null or point to null or a string from this library.
unsafe fn replace_str(
    s: *mut *mut c_char,
    f: impl FnOnce(&mut Vec<u8>) -> Result<(), Error>,
) -> Status {
    // SAFETY: Caller guarantees `s` is null or valid.
    let Some(slot) = (unsafe { s.as_mut() }) else {
        return Status::NullHandle;
    };
    // SAFETY: Strings from this library are null-terminated.
    let Some(old) = (unsafe { c_key(*slot) }) else {
        return Status::NullHandle;
    };
    let replaced = text::duplicate(old).and_then(|mut bytes| {
        f(&mut bytes)?;
        Ok(bytes)
    });
    match leak_str(replaced) {
        Ok(new) => {
            // SAFETY: `*slot` came from this library and is replaced below.
            unsafe { waxrt_str_free(*slot) };
            *slot = new;
            Status::Ok
        }
        Err(err) => Status::from(&err),
    }
}

/// Copy a C string into a new owned string.
///
/// Returns null if `s` is null or allocation fails.
///
/// # Safety
///
/// `s` must be null or a null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn waxrt_str_new(s: *const c_char) -> *mut c_char {
    // SAFETY: Forwarded from the caller.
    match unsafe { c_key(s) } {
        Some(bytes) => leak_str(text::duplicate(bytes)).unwrap_or(std::ptr::null_mut()),
        None => std::ptr::null_mut(),
    }
}

/// Append `tail` to the owned string at `*s`, which may move.
///
/// # Safety
///
/// `s` must be null or point to null or a live string from this library,
/// and `tail` must be null or a null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn waxrt_str_cat(s: *mut *mut c_char, tail: *const c_char) -> Status {
    // SAFETY: Forwarded from the caller.
    let Some(tail) = (unsafe { c_key(tail) }) else {
        return Status::NullHandle;
    };
    // SAFETY: Forwarded from the caller.
    unsafe { replace_str(s, |bytes| text::concat(bytes, tail)) }
}

/// Append the character with the low byte of `code` to the owned string at
/// `*s`, which may move.
///
/// A zero low byte leaves the string unchanged, since C would read it as
/// the terminator.
///
/// # Safety
///
/// `s` must be null or point to null or a live string from this library.
#[no_mangle]
pub unsafe extern "C" fn waxrt_str_add(s: *mut *mut c_char, code: c_int) -> Status {
    // SAFETY: Forwarded from the caller.
    unsafe {
        replace_str(s, |bytes| match code as u8 {
            0 => Ok(()),
            _ => text::push_code(bytes, code),
        })
    }
}

/// Copy `count` bytes of `s` starting at `index` into a new owned string,
/// stored through `out`.
///
/// # Safety
///
/// `s` must be null or a null-terminated string, and `out` must be null or
/// valid for a write.
#[no_mangle]
pub unsafe extern "C" fn waxrt_str_cpy(
    s: *const c_char,
    index: usize,
    count: usize,
    out: *mut *mut c_char,
) -> Status {
    // SAFETY: Caller guarantees both pointers are null or valid.
    let (Some(s), Some(out)) = (unsafe { c_key(s) }, unsafe { out.as_mut() }) else {
        return Status::NullHandle;
    };
    match leak_str(text::substr(s, index, count)) {
        Ok(part) => {
            *out = part;
            Status::Ok
        }
        Err(err) => Status::from(&err),
    }
}

/// Release an owned string. Null is ignored.
///
/// # Safety
///
/// `s` must be null or a live string from this library, and must not be
/// used afterwards.
#[no_mangle]
pub unsafe extern "C" fn waxrt_str_free(s: *mut c_char) {
    if !s.is_null() {
        // SAFETY: Our strings are exactly their bytes plus one terminator.
        let len = unsafe { CStr::from_ptr(s) }.to_bytes_with_nul().len();
        // SAFETY: The allocation is a leaked boxed slice of `len` bytes.
        unsafe { free_vec(s.cast::<u8>(), len) }
    }
}
