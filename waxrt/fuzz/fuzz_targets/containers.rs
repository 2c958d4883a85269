//! Fuzzer for the container API.
//!
//! Both containers manage raw storage internally, so every operation
//! sequence is replayed against a standard library model and the results
//! must agree exactly.

#![no_main]
use arbitrary::Arbitrary;
use arrayvec::ArrayVec;
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use waxrt::{DynArray, MapBuilder, SipBucketHash, StrKey, StrMap};

type Val = u64;

/// Short key: up to 4 bytes, possibly containing a NUL
type Key = ArrayVec<u8, 4>;

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    Insert(u16, Val),
    Push(Val),
    Remove(u16, u8),
    Set(u16, Val),
    Get(u16),
    Slice(u16, u8),
    MapSet(u8, [u8; 4], Val),
    MapGet(u8, [u8; 4]),
    MapRemove(u8, [u8; 4]),
    MapClear,
}

fn key(len: u8, bytes: [u8; 4]) -> Key {
    bytes[..usize::from(len) % 5].iter().copied().collect()
}

/// Model key as a map sees it: cut at the first NUL
fn model_key(key: &Key) -> Key {
    key.iter().copied().take_while(|&b| b != 0).collect()
}

struct Sim {
    arr: DynArray<Val>,
    vec: Vec<Val>,
    xor_map: StrMap<Val>,
    sip_map: waxrt::ChainMap<StrKey, Val, SipBucketHash>,
    model: HashMap<Key, Val>,
}

impl Sim {
    fn new() -> Self {
        Self {
            arr: DynArray::with_capacity(1).unwrap(),
            vec: Vec::new(),
            xor_map: StrMap::new().unwrap(),
            sip_map: MapBuilder::new()
                .buckets(NonZeroUsize::new(3).unwrap())
                .build_with_hasher(SipBucketHash::from_seed(b"fuzz"))
                .unwrap(),
            model: HashMap::new(),
        }
    }

    fn apply(&mut self, op: Op) {
        match op {
            Op::Insert(i, v) => {
                let i = usize::from(i);
                let r = self.arr.insert(i, v);
                if i <= self.vec.len() {
                    assert!(r.is_ok());
                    self.vec.insert(i, v);
                } else {
                    assert!(r.is_err());
                }
            }
            Op::Push(v) => {
                self.arr.push(v).unwrap();
                self.vec.push(v);
            }
            Op::Remove(i, n) => {
                let (i, n) = (usize::from(i), usize::from(n));
                let r = self.arr.remove(i, n);
                if i + n <= self.vec.len() {
                    assert!(r.is_ok());
                    self.vec.drain(i..i + n);
                } else {
                    assert!(r.is_err());
                }
            }
            Op::Set(i, v) => {
                let i = usize::from(i);
                let r = self.arr.set(i, v);
                match self.vec.get_mut(i) {
                    Some(slot) => {
                        assert!(r.is_ok());
                        *slot = v;
                    }
                    None => assert!(r.is_err()),
                }
            }
            Op::Get(i) => {
                let i = usize::from(i);
                assert_eq!(self.arr.get(i).ok(), self.vec.get(i).copied());
            }
            Op::Slice(i, n) => {
                let (i, n) = (usize::from(i), usize::from(n));
                match (self.arr.slice(i, n), self.vec.get(i..i + n)) {
                    (Ok(part), Some(expected)) => assert_eq!(part.as_slice(), expected),
                    (Err(_), None) => {}
                    (r, expected) => panic!("slice mismatch: {r:?} vs {expected:?}"),
                }
            }
            Op::MapSet(len, bytes, v) => {
                let k = key(len, bytes);
                let expected = self.model.insert(model_key(&k), v);
                assert_eq!(self.xor_map.set(&k, v), Ok(expected));
                assert_eq!(self.sip_map.set(&k, v), Ok(expected));
            }
            Op::MapGet(len, bytes) => {
                let k = key(len, bytes);
                let expected = self.model.get(&model_key(&k)).copied();
                assert_eq!(self.xor_map.get(&k), expected);
                assert_eq!(self.sip_map.get(&k), expected);
            }
            Op::MapRemove(len, bytes) => {
                let k = key(len, bytes);
                let expected = self.model.remove(&model_key(&k));
                assert_eq!(self.xor_map.remove(&k), expected);
                assert_eq!(self.sip_map.remove(&k), expected);
            }
            Op::MapClear => {
                self.xor_map.clear();
                self.sip_map.clear();
                self.model.clear();
            }
        }
        assert_eq!(self.arr.as_slice(), self.vec.as_slice());
        assert!(self.arr.capacity() >= self.arr.len());
        assert_eq!(self.xor_map.len(), self.model.len());
        assert_eq!(self.sip_map.len(), self.model.len());
    }
}

fuzz_target!(|ex: Vec<Op>| {
    let mut sim = Sim::new();
    for o in ex {
        sim.apply(o);
    }
});
