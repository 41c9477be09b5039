#![cfg(test)]

// Property tests for SlotMap, differential against the `slotmap` crate's
// SlotMap, which has the same key contract: keys resolve until removed and
// never resolve again.

use crate::key::SlotKey;
use crate::slot_map::SlotMap;
use proptest::prelude::*;
use slotmap::DefaultKey;
use std::panic::{catch_unwind, AssertUnwindSafe};

#[derive(Clone, Debug)]
enum Op {
    Insert(i32),
    InsertPanics,
    // Indices are taken modulo the number of live (or stale) keys.
    Remove(usize),
    RemoveStale(usize),
    SwapRemoveIndex(usize),
    Get(usize),
    Mutate(usize, i32),
    Reserve(usize),
    Retain(i32),
    Clear,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        8 => any::<i32>().prop_map(Op::Insert),
        1 => Just(Op::InsertPanics),
        4 => any::<usize>().prop_map(Op::Remove),
        1 => any::<usize>().prop_map(Op::RemoveStale),
        2 => (0usize..40).prop_map(Op::SwapRemoveIndex),
        2 => any::<usize>().prop_map(Op::Get),
        2 => (any::<usize>(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
        1 => (0usize..16).prop_map(Op::Reserve),
        1 => (2i32..5).prop_map(Op::Retain),
        1 => Just(Op::Clear),
    ];
    proptest::collection::vec(op, 1..120)
}

// Property: state-machine equivalence against slotmap::SlotMap.
// Invariants exercised across random operation sequences:
// - every live key resolves to the model's value; `key_at` inverts lookup;
// - removed keys never resolve again, even after their slot is reused;
// - removal returns the model's value and leaves other keys valid;
// - the element array stays packed and the free list covers exactly
//   `capacity - len` slots (checked by `assert_invariants`);
// - a panicking constructor leaves len, capacity and elements unchanged.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        let mut sut: SlotMap<i32> = SlotMap::new();
        let mut model: slotmap::SlotMap<DefaultKey, i32> = slotmap::SlotMap::new();
        let mut live: Vec<(SlotKey, DefaultKey)> = Vec::new();
        let mut stale: Vec<SlotKey> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(v) => {
                    let k = sut.insert(v);
                    prop_assert!(!stale.contains(&k), "reissued a stale key");
                    live.push((k, model.insert(v)));
                }
                Op::InsertPanics => {
                    let before = sut.as_slice().to_vec();
                    let cap = sut.capacity();
                    let r = catch_unwind(AssertUnwindSafe(|| {
                        sut.insert_with(|| panic!("constructor failed"))
                    }));
                    prop_assert!(r.is_err());
                    prop_assert_eq!(sut.as_slice(), &before[..]);
                    prop_assert_eq!(sut.capacity(), cap);
                }
                Op::Remove(i) => {
                    if !live.is_empty() {
                        let (k, mk) = live.swap_remove(i % live.len());
                        prop_assert_eq!(sut.remove(k), model.remove(mk));
                        prop_assert!(!sut.contains_key(k));
                        stale.push(k);
                    }
                }
                Op::RemoveStale(i) => {
                    if !stale.is_empty() {
                        let k = stale[i % stale.len()];
                        let len = sut.len();
                        prop_assert_eq!(sut.remove(k), None);
                        prop_assert_eq!(sut.len(), len);
                    }
                }
                Op::SwapRemoveIndex(pos) => {
                    match sut.swap_remove_index(pos) {
                        Some((k, v)) => {
                            let at = live.iter().position(|(lk, _)| *lk == k);
                            prop_assert!(at.is_some(), "removed key was not live");
                            let (_, mk) = live.swap_remove(at.unwrap_or_default());
                            prop_assert_eq!(Some(v), model.remove(mk));
                            stale.push(k);
                        }
                        None => prop_assert!(pos >= model.len()),
                    }
                }
                Op::Get(i) => {
                    if !live.is_empty() {
                        let (k, mk) = live[i % live.len()];
                        prop_assert_eq!(sut.get(k), model.get(mk));
                        prop_assert_eq!(sut.at(k).ok(), model.get(mk));
                    }
                }
                Op::Mutate(i, d) => {
                    if !live.is_empty() {
                        let (k, mk) = live[i % live.len()];
                        let v = &mut sut[k];
                        *v = v.wrapping_add(d);
                        let m = &mut model[mk];
                        *m = m.wrapping_add(d);
                    }
                }
                Op::Reserve(n) => {
                    let cap_before = sut.capacity();
                    let target = sut.len() + n;
                    sut.reserve(target);
                    prop_assert!(sut.capacity() >= target);
                    prop_assert!(cap_before >= target || sut.capacity() == target);
                }
                Op::Retain(m) => {
                    sut.retain(|_, v| v.rem_euclid(m) != 0);
                    model.retain(|_, v| v.rem_euclid(m) != 0);
                    let (keep, drop): (Vec<_>, Vec<_>) =
                        live.iter().copied().partition(|(_, mk)| model.contains_key(*mk));
                    live = keep;
                    stale.extend(drop.into_iter().map(|(k, _)| k));
                }
                Op::Clear => {
                    let cap = sut.capacity();
                    sut.clear();
                    model.clear();
                    prop_assert_eq!(sut.capacity(), cap);
                    stale.extend(live.drain(..).map(|(k, _)| k));
                }
            }

            // Post-conditions after each op
            sut.assert_invariants();
            prop_assert_eq!(sut.len(), model.len());
            for &(k, mk) in &live {
                prop_assert_eq!(sut.get(k), model.get(mk));
            }
            for &k in &stale {
                prop_assert!(!sut.contains_key(k));
            }
            for pos in 0..sut.len() {
                let k = sut.key_at(pos).expect("position in range");
                prop_assert_eq!(sut.get(k), Some(&sut.as_slice()[pos]));
            }
        }
    }
}

// Property: a clone taken at any point resolves every live key to the same
// value, and allocates the same keys as the original from then on.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_clone_preserves_keys(
        values in proptest::collection::vec(any::<i16>(), 1..40),
        removals in proptest::collection::vec(any::<usize>(), 0..20),
    ) {
        let mut sut = SlotMap::new();
        let mut keys: Vec<SlotKey> = values.iter().map(|v| sut.insert(*v)).collect();
        for r in removals {
            if keys.is_empty() {
                break;
            }
            let k = keys.swap_remove(r % keys.len());
            sut.remove(k);
        }
        let mut copy = sut.clone();
        copy.assert_invariants();
        prop_assert_eq!(&copy, &sut);
        for &k in &keys {
            prop_assert_eq!(copy.get(k), sut.get(k));
        }
        for v in 0..5i16 {
            prop_assert_eq!(copy.insert(v), sut.insert(v));
        }
    }
}
