use std::ffi::{c_char, CStr, CString};
use std::ptr;
use waxrt_ffi::*;

#[test]
fn array_through_handles() {
    unsafe {
        let arr = waxrt_arr_new(4);
        assert!(!arr.is_null());
        assert_eq!(waxrt_arr_cap(arr), 16);

        for (i, v) in [10u64, 20, 30].into_iter().enumerate() {
            assert_eq!(waxrt_arr_insert(arr, i, v), Status::Ok);
        }
        assert_eq!(waxrt_arr_remove(arr, 1, 1), Status::Ok);
        assert_eq!(waxrt_arr_len(arr), 2);

        let mut out = 0u64;
        assert_eq!(waxrt_arr_get(arr, 1, &mut out), Status::Ok);
        assert_eq!(out, 30);
        assert_eq!(waxrt_arr_get(arr, 2, &mut out), Status::OutOfRange);
        assert_eq!(waxrt_arr_insert(arr, 5, 0), Status::OutOfRange);

        // Narrow arrays keep the low half of each slot
        assert_eq!(waxrt_arr_set(arr, 0, 0x1_0000_0007), Status::Ok);
        let data = waxrt_arr_data(arr).cast::<u32>();
        assert_eq!(*data, 7);
        assert_eq!(*data.add(1), 30);

        let mut part = ptr::null_mut();
        assert_eq!(waxrt_arr_slice(arr, 1, 1, &mut part), Status::Ok);
        assert_eq!(waxrt_arr_len(part), 1);
        assert_eq!(waxrt_arr_cap(part), 1);
        assert_eq!(waxrt_arr_slice(arr, 1, 2, &mut part), Status::OutOfRange);

        waxrt_arr_free(part);
        waxrt_arr_free(arr);
    }
}

#[test]
fn wide_elements() {
    unsafe {
        let arr = waxrt_arr_new(8);
        assert_eq!(waxrt_arr_insert(arr, 0, u64::MAX), Status::Ok);
        let mut out = 0;
        assert_eq!(waxrt_arr_get(arr, 0, &mut out), Status::Ok);
        assert_eq!(out, u64::MAX);
        waxrt_arr_free(arr);
    }
    assert!(waxrt_arr_new(2).is_null());
}

#[test]
fn null_handles() {
    unsafe {
        assert_eq!(waxrt_arr_len(ptr::null()), 0);
        assert!(waxrt_arr_data(ptr::null_mut()).is_null());
        assert_eq!(waxrt_arr_insert(ptr::null_mut(), 0, 1), Status::NullHandle);
        assert_eq!(
            waxrt_arr_get(ptr::null(), 0, &mut 0u64),
            Status::NullHandle
        );
        waxrt_arr_free(ptr::null_mut());

        assert_eq!(waxrt_map_len(ptr::null()), 0);
        assert_eq!(waxrt_map_set_int(ptr::null_mut(), 1, 1), Status::NullHandle);
        assert_eq!(waxrt_map_get_int_or_zero(ptr::null_mut(), 1), 0);
        waxrt_map_free(ptr::null_mut());
        waxrt_vec_free_ints(ptr::null_mut(), 3);
    }
}

#[test]
fn int_map() {
    unsafe {
        let map = waxrt_map_new(0);
        assert_eq!(waxrt_map_set_int(map, 42, 100), Status::Ok);
        assert_eq!(waxrt_map_set_int(map, 7, 200), Status::Ok);
        assert_eq!(waxrt_map_set_int(map, 42, 150), Status::Ok);
        assert_eq!(waxrt_map_len(map), 2);

        let mut out = 0;
        assert_eq!(waxrt_map_get_int(map, 42, &mut out), Status::Ok);
        assert_eq!(out, 150);
        assert_eq!(waxrt_map_get_int(map, 8, &mut out), Status::KeyNotFound);
        assert_eq!(out, 150);
        assert_eq!(waxrt_map_get_int(map, 7, ptr::null_mut()), Status::Ok);
        assert_eq!(waxrt_map_get_int_or_zero(map, 7), 200);
        assert_eq!(waxrt_map_get_int_or_zero(map, 8), 0);

        assert_eq!(waxrt_map_remove_int(map, 42), Status::Ok);
        assert_eq!(waxrt_map_remove_int(map, 42), Status::Ok);
        assert_eq!(waxrt_map_len(map), 1);

        // String operations don't apply to an integer map
        let key = CString::new("k").unwrap();
        assert_eq!(waxrt_map_set_str(map, key.as_ptr(), 1), Status::BadKind);

        let stats = waxrt_map_stats(map);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.buckets, 64);
        assert_eq!(stats.to_bytes().len(), 32);
        waxrt_map_free(map);
    }
}

#[test]
fn str_map() {
    unsafe {
        let map = waxrt_map_new(1);
        let apple = CString::new("apple").unwrap();
        let pear = CString::new("pear").unwrap();
        assert_eq!(waxrt_map_set_str(map, apple.as_ptr(), 1), Status::Ok);
        assert_eq!(waxrt_map_set_str(map, pear.as_ptr(), 0), Status::Ok);

        // The map keeps its own copy of the key
        let lookup = CString::new("apple").unwrap();
        drop(apple);
        let mut out = -1;
        assert_eq!(waxrt_map_get_str(map, lookup.as_ptr(), &mut out), Status::Ok);
        assert_eq!(out, 1);
        assert_eq!(waxrt_map_get_str(map, pear.as_ptr(), &mut out), Status::Ok);
        assert_eq!(out, 0);

        assert_eq!(waxrt_map_remove_str(map, pear.as_ptr()), Status::Ok);
        assert_eq!(waxrt_map_get_str_or_zero(map, pear.as_ptr()), 0);
        assert_eq!(
            waxrt_map_get_str(map, pear.as_ptr(), &mut out),
            Status::KeyNotFound
        );
        assert_eq!(waxrt_map_set_int(map, 1, 1), Status::BadKind);
        assert_eq!(waxrt_map_set_str(map, ptr::null(), 1), Status::NullHandle);
        waxrt_map_free(map);
    }
}

#[test]
fn bulk_vectors() {
    unsafe {
        let ints = [3, 1, 4, 1, 5];
        let v = waxrt_vec_new_ints(ints.len(), ints.as_ptr());
        assert_eq!(std::slice::from_raw_parts(v, 5), &ints);
        waxrt_vec_free_ints(v, 5);

        let flts = [0.5f64, -1.25];
        let v = waxrt_vec_new_flts(flts.len(), flts.as_ptr());
        assert_eq!(std::slice::from_raw_parts(v, 2), &[0.5f32, -1.25]);
        waxrt_vec_free_flts(v, 2);

        let empty = waxrt_vec_new_ints(0, ptr::null());
        assert!(!empty.is_null());
        waxrt_vec_free_ints(empty, 0);

        let a = CString::new("a").unwrap();
        let b = CString::new("b").unwrap();
        let strs = [a.as_ptr(), b.as_ptr()];
        let v = waxrt_vec_new_strs(strs.len(), strs.as_ptr());
        assert_eq!(std::slice::from_raw_parts(v, 2), &strs);
        assert_eq!(CStr::from_ptr(*v.add(1)).to_bytes(), b"b");
        waxrt_vec_free_strs(v, 2);
    }
}

#[test]
fn missing_vector_values() {
    unsafe {
        assert!(waxrt_vec_new_ints(3, ptr::null()).is_null());
        assert!(waxrt_vec_new_flts(3, ptr::null()).is_null());
        assert!(waxrt_vec_new_strs(3, ptr::null()).is_null());
        assert!(waxrt_arr_new_ints(3, ptr::null()).is_null());
        assert!(waxrt_arr_new_flts(3, ptr::null()).is_null());
        assert!(waxrt_arr_new_strs(3, ptr::null()).is_null());

        let empty = waxrt_arr_new_flts(0, ptr::null());
        assert_eq!(waxrt_arr_len(empty), 0);
        assert_eq!(waxrt_arr_cap(empty), 0);
        waxrt_arr_free(empty);
    }
}

#[test]
fn prefilled_arrays() {
    unsafe {
        let ints = [-1, 2, 3];
        let arr = waxrt_arr_new_ints(ints.len(), ints.as_ptr());
        assert_eq!(waxrt_arr_len(arr), 3);
        assert_eq!(waxrt_arr_cap(arr), 3);
        let data = waxrt_arr_data(arr).cast::<i32>();
        assert_eq!(std::slice::from_raw_parts(data, 3), &ints);

        // Full arrays grow on the first insert
        assert_eq!(waxrt_arr_insert(arr, 3, 4), Status::Ok);
        assert!(waxrt_arr_cap(arr) > 3);
        waxrt_arr_free(arr);

        let flts = [0.5f64, -2.0];
        let arr = waxrt_arr_new_flts(flts.len(), flts.as_ptr());
        let data = waxrt_arr_data(arr).cast::<f32>();
        assert_eq!(std::slice::from_raw_parts(data, 2), &[0.5f32, -2.0]);
        let mut out = 0;
        assert_eq!(waxrt_arr_get(arr, 1, &mut out), Status::Ok);
        assert_eq!(out, u64::from((-2.0f32).to_bits()));
        waxrt_arr_free(arr);

        let name = CString::new("wax").unwrap();
        let strs = [name.as_ptr(), ptr::null()];
        let arr = waxrt_arr_new_strs(strs.len(), strs.as_ptr());
        assert_eq!(waxrt_arr_len(arr), 2);
        let data = waxrt_arr_data(arr).cast::<*const c_char>();
        assert_eq!(CStr::from_ptr(*data).to_bytes(), b"wax");
        assert!((*data.add(1)).is_null());
        waxrt_arr_free(arr);
    }
}

#[test]
fn map_kind_flag() {
    unsafe {
        // Any nonzero flag selects string keys
        let map = waxrt_map_new(2);
        let key = CString::new("k").unwrap();
        assert_eq!(waxrt_map_set_str(map, key.as_ptr(), 5), Status::Ok);
        assert_eq!(waxrt_map_set_int(map, 1, 1), Status::BadKind);
        assert_eq!(waxrt_map_get_str_or_zero(map, key.as_ptr()), 5);
        waxrt_map_free(map);
    }
}

#[test]
fn number_strings() {
    assert_eq!(waxrt_int2str(-42).as_bytes(), b"-42");
    assert_eq!(waxrt_int2str(i32::MIN).as_bytes(), b"-2147483648");
    assert_eq!(waxrt_flt2str(1.5e6).as_bytes(), b"1.5e+06");
    assert_eq!(waxrt_flt2str(0.25).as_bytes(), b"0.25");

    // The buffer is always terminated
    let rendered = waxrt_flt2str(-1.234_567e-20);
    assert_eq!(rendered.data[rendered.as_bytes().len()], 0);
    assert_eq!(rendered.as_bytes(), b"-1.23457e-20");
}

#[test]
fn owned_strings() {
    unsafe {
        let wax = CString::new("wax").unwrap();
        let mut s = waxrt_str_new(wax.as_ptr());
        assert_eq!(CStr::from_ptr(s).to_bytes(), b"wax");

        let tail = CString::new("work").unwrap();
        assert_eq!(waxrt_str_cat(&mut s, tail.as_ptr()), Status::Ok);
        assert_eq!(waxrt_str_add(&mut s, i32::from(b's')), Status::Ok);
        // Only the low byte is kept
        assert_eq!(waxrt_str_add(&mut s, 0x121), Status::Ok);
        // A zero byte would end the C string, so nothing is appended
        assert_eq!(waxrt_str_add(&mut s, 0x100), Status::Ok);
        assert_eq!(CStr::from_ptr(s).to_bytes(), b"waxworks!");

        let mut part = ptr::null_mut();
        assert_eq!(waxrt_str_cpy(s, 3, 4, &mut part), Status::Ok);
        assert_eq!(CStr::from_ptr(part).to_bytes(), b"work");
        waxrt_str_free(part);

        assert_eq!(waxrt_str_cpy(s, 9, 0, &mut part), Status::Ok);
        assert_eq!(CStr::from_ptr(part).to_bytes(), b"");
        waxrt_str_free(part);

        let mut untouched = ptr::null_mut();
        assert_eq!(waxrt_str_cpy(s, 6, 4, &mut untouched), Status::OutOfRange);
        assert!(untouched.is_null());

        assert_eq!(waxrt_str_cat(&mut s, ptr::null()), Status::NullHandle);
        assert_eq!(CStr::from_ptr(s).to_bytes(), b"waxworks!");
        waxrt_str_free(s);

        let mut missing: *mut c_char = ptr::null_mut();
        assert_eq!(waxrt_str_cat(&mut missing, tail.as_ptr()), Status::NullHandle);
        assert_eq!(waxrt_str_add(ptr::null_mut(), 1), Status::NullHandle);
        assert!(waxrt_str_new(ptr::null()).is_null());
        waxrt_str_free(ptr::null_mut());
    }
}

#[test]
fn reinterpret() {
    assert_eq!(waxrt_reinterp_f2i(1.0), 0x3f80_0000);
    assert_eq!(waxrt_reinterp_i2f(0x3f80_0000), 1.0);
}
