//! Behavior of DynArray under insert, remove and slice sequences

use proptest::prelude::*;
use waxrt::{try_box, DynArray, Error, DEFAULT_CAPACITY};

#[test]
fn insert_then_remove_middle() {
    let mut arr = DynArray::<i32>::new().unwrap();
    arr.insert(0, 10).unwrap();
    arr.insert(1, 20).unwrap();
    arr.insert(2, 30).unwrap();
    arr.remove(1, 1).unwrap();
    assert_eq!(arr.as_slice(), &[10, 30]);
    assert_eq!(arr.len(), 2);
}

#[test]
fn insert_shifts_right() {
    let mut arr = DynArray::<u8>::new().unwrap();
    for x in [1, 2, 3] {
        arr.push(x).unwrap();
    }
    arr.insert(0, 0).unwrap();
    arr.insert(2, 9).unwrap();
    assert_eq!(arr.as_slice(), &[0, 1, 9, 2, 3]);
}

#[test]
fn remove_shifts_left() {
    let mut arr = DynArray::from_slice(&[0u16, 1, 2, 3, 4, 5, 6]).unwrap();
    arr.remove(2, 3).unwrap();
    assert_eq!(arr.as_slice(), &[0, 1, 5, 6]);
    arr.remove(4, 0).unwrap();
    assert_eq!(arr.len(), 4);
    arr.remove(0, 4).unwrap();
    assert!(arr.is_empty());
}

#[test]
fn get_and_set() {
    let mut arr = DynArray::from_slice(&[1.5f32, 2.5]).unwrap();
    assert_eq!(arr.get(1), Ok(2.5));
    arr.set(0, -1.0).unwrap();
    assert_eq!(arr.get(0), Ok(-1.0));
}

#[test]
fn out_of_range() {
    let mut arr = DynArray::from_slice(&[1i64, 2, 3]).unwrap();
    assert_eq!(
        arr.get(3),
        Err(Error::OutOfRange {
            start: 3,
            end: 4,
            len: 3
        })
    );
    assert!(matches!(arr.set(7, 0), Err(Error::OutOfRange { .. })));
    assert!(matches!(arr.insert(4, 0), Err(Error::OutOfRange { .. })));
    assert!(matches!(arr.remove(2, 2), Err(Error::OutOfRange { .. })));
    assert!(matches!(
        arr.remove(usize::MAX, 2),
        Err(Error::OutOfRange { .. })
    ));
    assert!(matches!(arr.slice(1, 3), Err(Error::OutOfRange { .. })));

    // Failed operations leave the array alone
    assert_eq!(arr.as_slice(), &[1, 2, 3]);
}

#[test]
fn slice_is_independent() {
    let mut source = DynArray::from_slice(&[5u32, 6, 7, 8]).unwrap();
    let mut part = source.slice(1, 2).unwrap();
    assert_eq!(part.as_slice(), &[6, 7]);
    assert_eq!(part.capacity(), 2);

    part.set(0, 60).unwrap();
    part.push(70).unwrap();
    source.set(2, 0).unwrap();
    drop(part);

    assert_eq!(source.as_slice(), &[5, 6, 0, 8]);
    assert_eq!(source.slice(4, 0).unwrap().len(), 0);
}

#[test]
fn growth_policy() {
    let mut arr = DynArray::<u64>::new().unwrap();
    assert_eq!(arr.capacity(), DEFAULT_CAPACITY);

    let mut seen = vec![arr.capacity()];
    for i in 0..100 {
        arr.push(i).unwrap();
        assert!(arr.capacity() >= arr.len());
        if arr.capacity() != *seen.last().unwrap() {
            seen.push(arr.capacity());
        }
    }
    assert_eq!(seen, [16, 24, 36, 54, 81, 121]);
}

#[test]
fn logarithmic_reallocation() {
    let n = 100_000u32;
    let mut arr = DynArray::<u32>::new().unwrap();
    let mut reallocations = 0;
    for i in 0..n {
        let before = arr.capacity();
        arr.push(i).unwrap();
        if arr.capacity() != before {
            reallocations += 1;
        }
    }
    // Each step multiplies capacity by at least 1.5
    let bound = (f64::from(n) / 16.0).log(1.5).ceil() as u32 + 1;
    assert!(reallocations <= bound, "{reallocations} > {bound}");
    assert_eq!(arr.get(n as usize - 1), Ok(n - 1));
}

#[test]
fn empty_capacity_grows() {
    let mut arr = DynArray::<i8>::with_capacity(0).unwrap();
    assert_eq!(arr.capacity(), 0);
    arr.push(1).unwrap();
    assert_eq!(arr.capacity(), 4);

    let mut full = waxrt::bulk_array![1u8, 2, 3].unwrap();
    assert_eq!(full.capacity(), 3);
    full.insert(1, 7).unwrap();
    assert_eq!(full.capacity(), 7);
    assert_eq!(full.as_slice(), &[1, 7, 2, 3]);
}

#[test]
fn debug_and_eq() {
    let a = DynArray::from_slice(&[1, 2]).unwrap();
    let mut b = DynArray::new().unwrap();
    b.push(1).unwrap();
    b.push(2).unwrap();
    assert_eq!(a, b);
    assert_eq!(format!("{:?}", a), "[1, 2]");
    assert_eq!(a.iter().sum::<i32>(), 3);
}

#[test]
fn boxed_arrays() {
    let arr = DynArray::from_slice(&[4u32, 5]).unwrap();
    let boxed = try_box(arr).unwrap();
    assert_eq!(boxed.as_slice(), &[4, 5]);
    assert_eq!(boxed.capacity(), 2);

    // Zero-sized values don't allocate
    assert!(try_box(()).is_ok());
}

/// One mutation applied to both the array and a Vec model
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Remove(usize, usize),
    Set(usize, i32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (any::<usize>(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
        1 => (any::<usize>(), 0usize..5).prop_map(|(i, n)| Op::Remove(i, n)),
        1 => (any::<usize>(), any::<i32>()).prop_map(|(i, v)| Op::Set(i, v)),
    ]
}

proptest! {
    #[test]
    fn matches_vec_model(ops in prop::collection::vec(op(), 0..300)) {
        let mut arr = DynArray::new().unwrap();
        let mut model: Vec<i32> = Vec::new();
        let mut inserted = 0usize;
        let mut removed = 0usize;

        for op in ops {
            match op {
                Op::Insert(i, v) => {
                    let i = i % (model.len() + 1);
                    arr.insert(i, v).unwrap();
                    model.insert(i, v);
                    inserted += 1;
                }
                Op::Remove(i, n) => {
                    if model.is_empty() {
                        prop_assert!(arr.remove(0, n.max(1)).is_err());
                        continue;
                    }
                    let i = i % model.len();
                    let n = n.min(model.len() - i);
                    arr.remove(i, n).unwrap();
                    model.drain(i..i + n);
                    removed += n;
                }
                Op::Set(i, v) => {
                    if model.is_empty() {
                        prop_assert!(arr.set(0, v).is_err());
                        continue;
                    }
                    let i = i % model.len();
                    arr.set(i, v).unwrap();
                    model[i] = v;
                }
            }
            prop_assert!(arr.capacity() >= arr.len());
        }

        prop_assert_eq!(arr.len(), inserted - removed);
        prop_assert_eq!(arr.as_slice(), model.as_slice());
        for (i, v) in model.iter().enumerate() {
            prop_assert_eq!(arr.get(i), Ok(*v));
        }
    }

    #[test]
    fn slices_copy_out(items in prop::collection::vec(any::<u16>(), 0..64), a in any::<usize>(), b in any::<usize>()) {
        let arr = DynArray::from_slice(&items).unwrap();
        let start = a % (items.len() + 1);
        let count = b % (items.len() - start + 1);
        let part = arr.slice(start, count).unwrap();
        prop_assert_eq!(part.as_slice(), &items[start..start + count]);
        drop(part);
        prop_assert_eq!(arr.as_slice(), items.as_slice());
    }
}
