#![cfg(test)]

// Property tests for CoreMap kept inside the crate so they can reach the
// crate-private positional operations.

use crate::core_map::{CoreMap, Handle};
use crate::error::MapError;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Hash)]
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

// Pool-indexed operations so shrinking converges on earlier keys.
#[derive(Clone, Debug)]
enum OpI {
    Set(usize, i32),
    GetOrInsert(usize, i32),
    Delete(usize),
    PopItem,
    MoveBack(usize),
    MoveFront(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Clear,
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
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Set(i, v)),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::GetOrInsert(i, v)),
            2 => idx.clone().prop_map(OpI::Delete),
            1 => Just(OpI::PopItem),
            1 => idx.clone().prop_map(OpI::MoveBack),
            1 => idx.clone().prop_map(OpI::MoveFront),
            1 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

/// Reference model: values by key plus the expected iteration order.
#[derive(Default)]
struct Model {
    values: HashMap<Key, i32>,
    order: Vec<Key>,
}

impl Model {
    fn unlink(&mut self, k: &Key) {
        self.order.retain(|o| o != k);
    }
}

// State-machine equivalence against the model. After every op:
// - iteration order (forward and reverse) matches the model order;
// - sequence stamps strictly increase along that order;
// - live handles still resolve to their key, stale handles never resolve;
// - len/is_empty parity with the model.
fn run_scenario<S: BuildHasher>(
    mut sut: CoreMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model = Model::default();
    let mut live: HashMap<Key, Handle> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();
    let default_calls = Cell::new(0);

    for op in ops {
        match op {
            OpI::Set(i, v) => {
                let k = key_from(pool, i);
                let prev = sut.set(k.clone(), v);
                prop_assert_eq!(prev, model.values.insert(k.clone(), v));
                if prev.is_none() {
                    model.order.push(k.clone());
                    let h = sut.find(&k).expect("just inserted");
                    live.insert(k, h);
                }
            }
            OpI::GetOrInsert(i, v) => {
                let k = key_from(pool, i);
                let before = default_calls.get();
                let already = model.values.contains_key(&k);
                let got = *sut.get_or_insert_with(k.clone(), || {
                    default_calls.set(default_calls.get() + 1);
                    v
                });
                let expected_calls = if already { before } else { before + 1 };
                prop_assert_eq!(default_calls.get(), expected_calls);
                if !already {
                    model.values.insert(k.clone(), v);
                    model.order.push(k.clone());
                    let h = sut.find(&k).expect("just inserted");
                    live.insert(k.clone(), h);
                }
                prop_assert_eq!(got, model.values[&k]);
            }
            OpI::Delete(i) => {
                let k = key_from(pool, i);
                match model.values.remove(&k) {
                    Some(mv) => {
                        prop_assert_eq!(sut.delete(&k), Ok(mv));
                        model.unlink(&k);
                        if let Some(h) = live.remove(&k) {
                            stale.push(h);
                        }
                    }
                    None => prop_assert_eq!(sut.delete(&k), Err(MapError::KeyNotFound)),
                }
            }
            OpI::PopItem => match model.order.pop() {
                Some(k) => {
                    let mv = model.values.remove(&k).expect("ordered key in model");
                    prop_assert_eq!(sut.pop_item(), Ok((k.clone(), mv)));
                    if let Some(h) = live.remove(&k) {
                        stale.push(h);
                    }
                }
                None => prop_assert_eq!(sut.pop_item(), Err(MapError::EmptyContainer)),
            },
            OpI::MoveBack(i) => {
                let k = key_from(pool, i);
                let present = model.values.contains_key(&k);
                prop_assert_eq!(sut.move_back(&k), present);
                if present {
                    model.unlink(&k);
                    model.order.push(k);
                }
            }
            OpI::MoveFront(i) => {
                let k = key_from(pool, i);
                let present = model.values.contains_key(&k);
                prop_assert_eq!(sut.move_front(&k), present);
                if present {
                    model.unlink(&k);
                    model.order.insert(0, k);
                }
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                let found = sut.find(&k);
                prop_assert_eq!(found.is_some(), model.values.contains_key(&k));
                if let Some(h) = found {
                    prop_assert_eq!(Some(&h), live.get(&k), "handle must be stable");
                }
            }
            OpI::Contains(s) => {
                let has_model = model.values.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                if let Some(&h) = live.get(&k) {
                    let Some(vr) = h.value_mut(&mut sut) else {
                        return Err(TestCaseError::fail("live handle should resolve"));
                    };
                    *vr = vr.saturating_add(d);
                    if let Some(mv) = model.values.get_mut(&k) {
                        *mv = mv.saturating_add(d);
                    }
                }
            }
            OpI::Clear => {
                sut.clear();
                stale.extend(live.drain().map(|(_, h)| h));
                model = Model::default();
            }
        }

        let forward: Vec<Key> = sut.iter().map(|(k, _)| k.clone()).collect();
        prop_assert_eq!(&forward, &model.order);
        let mut backward: Vec<Key> = sut.iter().rev().map(|(k, _)| k.clone()).collect();
        backward.reverse();
        prop_assert_eq!(&backward, &model.order);

        let seqs: Vec<i64> = forward
            .iter()
            .map(|k| sut.sequence_of(k).expect("live key has a sequence"))
            .collect();
        prop_assert!(seqs.windows(2).all(|w| w[0] < w[1]), "sequences {:?}", seqs);

        for (k, v) in &model.values {
            prop_assert_eq!(sut.get(k), Some(v));
        }
        for (k, h) in &live {
            prop_assert_eq!(h.key(&sut), Some(k));
        }
        for h in &stale {
            prop_assert!(h.value(&sut).is_none());
        }
        prop_assert_eq!(sut.len(), model.values.len());
        prop_assert_eq!(sut.is_empty(), model.values.is_empty());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(CoreMap::new(), &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
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

// Same invariants with every key in one bucket.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(CoreMap::with_hasher(ConstBuildHasher), &pool, ops)?;
    }
}
