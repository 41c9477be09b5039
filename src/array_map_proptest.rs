#![cfg(test)]

// Property tests for ArrayMap kept inside the crate so they can inspect
// capacity and internal ordering without extra public surface.

use crate::array_map::{ArrayMap, OrderBy};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

// Pool-indexed operations so shrinking moves toward earlier keys and
// shorter op lists.
#[derive(Clone, Debug)]
enum OpI {
    Emplace(usize, i32),
    EmplacePanics(usize),
    Assign(usize, i32),
    Remove(usize),
    RemoveIndex(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Reserve(usize),
    Retain(i32),
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=10).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Emplace(i, v)),
            1 => idx.clone().prop_map(OpI::EmplacePanics),
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Assign(i, v)),
            3 => idx.clone().prop_map(OpI::Remove),
            1 => (0usize..12).prop_map(OpI::RemoveIndex),
            2 => idx.clone().prop_map(OpI::Find),
            2 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,4}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => (0usize..8).prop_map(OpI::Reserve),
            1 => (2i32..5).prop_map(OpI::Retain),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: state-machine equivalence against BTreeMap.
// Invariants exercised across random operation sequences:
// - keys stay strictly sorted; key/value pairing matches the model;
// - emplace never overwrites and reports insertion exactly when absent;
// - insert_or_assign overwrites in place;
// - a panicking value constructor leaves keys, values and capacity as-is;
// - removal by key or index returns the owned pair the model held;
// - len/capacity bookkeeping (len <= capacity, reserve never shrinks).
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: ArrayMap<String, i32> = ArrayMap::new();
        let mut model: BTreeMap<String, i32> = BTreeMap::new();

        for op in ops {
            match op {
                OpI::Emplace(i, v) => {
                    let k = pool[i].clone();
                    let already = model.contains_key(&k);
                    let (pos, inserted) = sut.emplace(k.clone(), v);
                    prop_assert_eq!(inserted, !already);
                    prop_assert_eq!(&sut.keys()[pos], &k);
                    model.entry(k).or_insert(v);
                }
                OpI::EmplacePanics(i) => {
                    let k = pool[i].clone();
                    let keys_before = sut.keys().to_vec();
                    let values_before = sut.values().to_vec();
                    let cap_before = sut.capacity();
                    let already = model.contains_key(&k);
                    let r = catch_unwind(AssertUnwindSafe(|| {
                        sut.emplace_with(k.clone(), || panic!("value constructor failed"))
                    }));
                    // The constructor only runs when the key is absent.
                    prop_assert_eq!(r.is_err(), !already);
                    prop_assert_eq!(sut.keys(), &keys_before[..]);
                    prop_assert_eq!(sut.values(), &values_before[..]);
                    prop_assert_eq!(sut.capacity(), cap_before);
                }
                OpI::Assign(i, v) => {
                    let k = pool[i].clone();
                    let already = model.contains_key(&k);
                    let (pos, inserted) = sut.insert_or_assign(k.clone(), v);
                    prop_assert_eq!(inserted, !already);
                    prop_assert_eq!(sut.values()[pos], v);
                    model.insert(k, v);
                }
                OpI::Remove(i) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.remove(k.as_str()), model.remove_entry(k));
                    prop_assert!(!sut.contains_key(k.as_str()));
                }
                OpI::RemoveIndex(i) => {
                    if i < sut.len() {
                        let expected = model.iter().nth(i).map(|(k, v)| (k.clone(), *v));
                        let got = sut.remove_index(i);
                        prop_assert_eq!(Some(&got), expected.as_ref());
                        model.remove(&got.0);
                    }
                }
                OpI::Find(i) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.get(k.as_str()), model.get(k));
                    prop_assert_eq!(sut.position(k.as_str()).is_some(), model.contains_key(k));
                }
                OpI::Contains(s) => {
                    prop_assert_eq!(sut.contains_key(s.as_str()), model.contains_key(&s));
                }
                OpI::Mutate(i, d) => {
                    let k = &pool[i];
                    if let Some(v) = sut.get_mut(k.as_str()) {
                        *v = v.wrapping_add(d);
                    }
                    if let Some(v) = model.get_mut(k) {
                        *v = v.wrapping_add(d);
                    }
                }
                OpI::Reserve(n) => {
                    let cap_before = sut.capacity();
                    let target = sut.len() + n;
                    sut.reserve(target);
                    prop_assert!(sut.capacity() >= target);
                    prop_assert!(cap_before >= target || sut.capacity() == target);
                    prop_assert!(sut.capacity() >= cap_before);
                }
                OpI::Retain(m) => {
                    sut.retain(|_, v| v.rem_euclid(m) != 0);
                    model.retain(|_, v| v.rem_euclid(m) != 0);
                }
                OpI::Clear => {
                    sut.clear();
                    model.clear();
                    prop_assert_eq!(sut.capacity(), 0);
                }
            }

            // Post-conditions after each op
            prop_assert!(sut.keys().windows(2).all(|w| w[0] < w[1]), "keys not strictly sorted");
            prop_assert!(sut.len() <= sut.capacity());
            prop_assert_eq!(sut.len(), model.len());
            let pairs: Vec<(String, i32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
            let expected: Vec<(String, i32)> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
            prop_assert_eq!(pairs, expected);
        }
    }
}

// Property: a reversed comparator yields the model's order reversed, and
// equivalence under it still collapses duplicates.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_custom_order(keys in proptest::collection::vec(0u16..64, 0..100)) {
        let mut sut = ArrayMap::with_comparator(OrderBy(|a: &u16, b: &u16| a > b));
        let mut model: BTreeMap<u16, usize> = BTreeMap::new();
        for (i, k) in keys.iter().enumerate() {
            sut.emplace(*k, i);
            model.entry(*k).or_insert(i);
        }
        let got: Vec<(u16, usize)> = sut.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u16, usize)> = model.into_iter().rev().collect();
        prop_assert_eq!(got, expected);
    }
}

// Property: bulk construction agrees with incremental emplace when the
// input has no duplicates, and fails exactly when it does.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_try_from_iter(pairs in proptest::collection::vec((0u8..32, any::<i32>()), 0..40)) {
        let mut distinct: Vec<u8> = pairs.iter().map(|(k, _)| *k).collect();
        distinct.sort_unstable();
        distinct.dedup();
        let has_dup = distinct.len() != pairs.len();

        match ArrayMap::<u8, i32>::try_from_iter(pairs.clone()) {
            Ok(bulk) => {
                prop_assert!(!has_dup);
                let mut incremental = ArrayMap::new();
                for (k, v) in pairs {
                    incremental.emplace(k, v);
                }
                prop_assert_eq!(bulk, incremental);
            }
            Err(e) => {
                prop_assert!(has_dup);
                prop_assert_eq!(e, crate::Error::DuplicateKey);
            }
        }
    }
}
