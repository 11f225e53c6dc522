#![cfg(test)]

// Property tests for LinkedHandleMap kept inside the crate so they do not
// require feature gates to access internal modules.

use crate::error::InsertError;
use crate::linked_handle_map::{Handle, LinkedHandleMap};
use crate::Order;
use proptest::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hasher;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations so shrinking moves toward earlier keys.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    RemoveOldest,
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Walk,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            idx.clone().prop_map(OpI::Remove),
            Just(OpI::RemoveOldest),
            idx.clone().prop_map(OpI::Find),
            prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            Just(OpI::Walk),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Model: a Vec of (key, value) in insertion order plus the handle issued for
// each live key. Invariants checked after every op:
// - Duplicate keys are rejected; on success a unique stable Handle is returned.
// - `remove(handle)` returns the owned pair and splices the sequence.
// - Forward and backward walks equal the model order and its reverse.
// - Head/tail agree with the model's first/last; stale handles never resolve.
fn run_scenario<S>(mut sut: LinkedHandleMap<Key, i32, S>, pool: Vec<String>, ops: Vec<OpI>) -> Result<(), TestCaseError>
where
    S: std::hash::BuildHasher,
{
    let mut model: Vec<(Key, i32)> = Vec::new();
    let mut live: HashMap<Key, Handle> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(&pool, i);
                let already = live.contains_key(&k);
                match sut.insert(k.clone(), v) {
                    Ok(h) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        prop_assert!(live.insert(k.clone(), h).is_none());
                        model.push((k, v));
                    }
                    Err(InsertError::DuplicateKey) => {
                        prop_assert!(already, "duplicate error only when key exists");
                    }
                }
            }
            OpI::Remove(i) => {
                let k = key_from(&pool, i);
                if let Some(h) = live.remove(&k) {
                    let (kk, vv) = sut.remove(h).expect("handle valid for removal");
                    let pos = model.iter().position(|(mk, _)| *mk == k).expect("in model");
                    let (mk, mv) = model.remove(pos);
                    prop_assert_eq!(kk, mk);
                    prop_assert_eq!(vv, mv);
                    stale.push(h);
                } else {
                    prop_assert!(sut.find(&k).is_none());
                }
            }
            OpI::RemoveOldest => {
                match sut.head() {
                    Some(h) => {
                        let (kk, vv) = sut.remove(h).expect("head is live");
                        let (mk, mv) = model.remove(0);
                        prop_assert_eq!(&kk, &mk);
                        prop_assert_eq!(vv, mv);
                        live.remove(&kk);
                        stale.push(h);
                    }
                    None => prop_assert!(model.is_empty()),
                }
            }
            OpI::Find(i) => {
                let k = key_from(&pool, i);
                let found = sut.find(&k);
                prop_assert_eq!(found, live.get(&k).copied());
            }
            OpI::Contains(s) => {
                let has_model = model.iter().any(|(k, _)| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(&pool, i);
                if let Some(&h) = live.get(&k) {
                    let vr = h.value_mut(&mut sut).expect("live handle should resolve");
                    *vr = vr.saturating_add(d);
                    if let Some((_, mv)) = model.iter_mut().find(|(mk, _)| *mk == k) {
                        *mv = mv.saturating_add(d);
                    }
                }
            }
            OpI::Walk => {
                let fwd: Vec<(Key, i32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(&fwd, &model);
                let mut bwd: Vec<(Key, i32)> = sut
                    .iter_in(Order::Backward)
                    .map(|(k, v)| (k.clone(), *v))
                    .collect();
                bwd.reverse();
                prop_assert_eq!(&bwd, &model);
            }
        }

        for &h in &stale {
            prop_assert!(h.value(&sut).is_none());
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(sut.head().and_then(|h| h.key(&sut)), model.first().map(|(k, _)| k));
        prop_assert_eq!(sut.tail().and_then(|h| h.key(&sut)), model.last().map(|(k, _)| k));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(LinkedHandleMap::new(), pool, ops)?;
    }
}

// Collision variant: a constant hasher stresses equality probing and
// index unlinking by handle identity.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl std::hash::BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(LinkedHandleMap::with_hasher(ConstBuildHasher), pool, ops)?;
    }
}
