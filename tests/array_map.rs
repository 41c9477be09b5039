use packed_maps::{ArrayMap, Error, Limited, NaturalOrder, OrderBy};

#[test]
fn iterates_in_key_order() {
    let mut m = ArrayMap::new();
    m.emplace(3, "c".to_string());
    m.emplace(1, "a".to_string());
    m.emplace(2, "b".to_string());
    let values: Vec<&str> = m.values().iter().map(String::as_str).collect();
    assert_eq!(values, ["a", "b", "c"]);
    assert_eq!(m.keys(), &[1, 2, 3]);
    assert_eq!(m.first_key_value(), Some((&1, &"a".to_string())));
    assert_eq!(m.last_key_value(), Some((&3, &"c".to_string())));
}

#[test]
fn emplace_reports_position_and_keeps_existing() {
    let mut m = ArrayMap::new();
    assert_eq!(m.emplace("m", 1), (0, true));
    assert_eq!(m.emplace("a", 2), (0, true));
    assert_eq!(m.emplace("z", 3), (2, true));
    // Equivalent key: nothing changes, the existing position is reported.
    assert_eq!(m.emplace("m", 99), (1, false));
    assert_eq!(m["m"], 1);

    // The constructor does not run for a present key.
    let mut ran = false;
    assert_eq!(
        m.emplace_with("a", || {
            ran = true;
            0
        }),
        (0, false)
    );
    assert!(!ran);
}

#[test]
fn insert_or_assign_overwrites_in_place() {
    let mut m = ArrayMap::new();
    m.insert_or_assign(10, 'x');
    m.insert_or_assign(5, 'y');
    assert_eq!(m.insert_or_assign(10, 'z'), (1, false));
    assert_eq!(m.get(&10), Some(&'z'));
    assert_eq!(m.len(), 2);
}

#[test]
fn checked_access_and_lookup_by_borrowed_form() {
    let mut m: ArrayMap<String, u32> = ArrayMap::new();
    m.emplace("alpha".into(), 1);
    m.emplace("beta".into(), 2);
    assert_eq!(m.at("beta"), Ok(&2));
    assert_eq!(m.at("gamma"), Err(Error::KeyNotFound));
    *m.at_mut("alpha").unwrap() += 10;
    assert_eq!(m.get_key_value("alpha"), Some((&"alpha".to_string(), &11)));
    assert!(m.contains_key("beta"));
    assert!(!m.contains_key("be"));
    assert_eq!(m.position("beta"), Some(1));
    assert_eq!(m.remove("alpha"), Some(("alpha".to_string(), 11)));
    assert_eq!(m.remove("alpha"), None);
}

#[test]
#[should_panic]
fn index_panics_on_missing_key() {
    let m: ArrayMap<u8, u8> = ArrayMap::new();
    let _v: u8 = m[&1];
}

#[test]
fn comparator_defines_order_and_equivalence() {
    // Case-insensitive keys: "B" and "b" are the same key.
    let mut m = ArrayMap::with_comparator(OrderBy(|a: &&str, b: &&str| {
        a.to_ascii_lowercase() < b.to_ascii_lowercase()
    }));
    m.emplace("b", 1);
    m.emplace("A", 2);
    assert_eq!(m.emplace("B", 3), (1, false));
    assert_eq!(m.keys(), &["A", "b"]);
    assert_eq!(m.get(&"a"), Some(&2));
}

#[test]
fn bulk_construction_sorts_and_rejects_duplicates() {
    let m = ArrayMap::<i32, &str>::try_from_iter([(3, "c"), (1, "a"), (2, "b")]).unwrap();
    assert_eq!(m.keys(), &[1, 2, 3]);
    assert_eq!(m.capacity(), 3);

    let dup = ArrayMap::<i32, &str>::try_from_iter([(1, "a"), (2, "b"), (1, "c")]);
    assert_eq!(dup.unwrap_err(), Error::DuplicateKey);

    // Incremental emplace of the same input keeps the first entry instead.
    let mut m = ArrayMap::new();
    for (k, v) in [(1, "a"), (2, "b"), (1, "c")] {
        m.emplace(k, v);
    }
    assert_eq!(m[&1], "a");
}

#[test]
fn reserve_is_exact_and_never_shrinks() {
    let mut m: ArrayMap<u32, u32> = ArrayMap::with_capacity(3);
    assert_eq!(m.capacity(), 3);
    m.reserve(10);
    assert_eq!(m.capacity(), 10);
    m.reserve(2);
    assert_eq!(m.capacity(), 10);
    for i in 0..10 {
        m.emplace(i, i);
    }
    assert_eq!(m.capacity(), 10);
    m.emplace(10, 10);
    assert_eq!(m.capacity(), 20);
}

#[test]
fn bounded_allocator_caps_growth() {
    let mut m = ArrayMap::with_comparator_in(NaturalOrder, Limited::new(4 * 4));
    let _: &Limited = m.allocator();
    for i in 0u32..4 {
        m.emplace(i, i);
    }
    assert_eq!(m.max_len(), 4);
    assert_eq!(
        m.try_emplace_with(9, || 9),
        Err(Error::CapacityOverflow {
            requested: 5,
            max: 4
        })
    );
    assert_eq!(
        m.try_insert_or_assign(9, 9),
        Err(Error::CapacityOverflow {
            requested: 5,
            max: 4
        })
    );
    // Assigning an existing key needs no room.
    assert_eq!(m.try_insert_or_assign(2, 20), Ok((2, false)));
    assert_eq!(m.values(), &[0, 1, 20, 3]);
}

#[test]
fn clone_eq_and_debug() {
    let mut m = ArrayMap::new();
    m.emplace(2, "two");
    m.emplace(1, "one");
    let c = m.clone();
    assert_eq!(m, c);
    assert_eq!(format!("{:?}", c), r#"{1: "one", 2: "two"}"#);
    m.remove(&1);
    assert_ne!(m, c);
}

#[test]
fn owned_and_borrowed_iteration() {
    let mut m = ArrayMap::new();
    for k in [5, 1, 4, 2, 3] {
        m.emplace(k, k * 100);
    }
    for (_, v) in &mut m {
        *v += 1;
    }
    let borrowed: Vec<(i32, i32)> = (&m).into_iter().map(|(k, v)| (*k, *v)).collect();
    let owned: Vec<(i32, i32)> = m.into_iter().rev().collect();
    assert_eq!(borrowed.len(), 5);
    assert_eq!(owned.iter().rev().copied().collect::<Vec<_>>(), borrowed);
    assert_eq!(borrowed[0], (1, 101));
}

#[test]
fn reserve_on_a_populated_map_targets_total_capacity() {
    let mut m: ArrayMap<u32, u32> = ArrayMap::new();
    for i in 0..10 {
        m.emplace(i, i);
    }
    assert_eq!(m.capacity(), 16);
    m.reserve(12);
    assert_eq!(m.capacity(), 16);
    m.reserve(24);
    assert_eq!(m.capacity(), 24);
    assert_eq!(m.len(), 10);
}

#[test]
fn bulk_construction_with_injected_comparator_rejects_equivalent_keys() {
    let caseless = OrderBy(|a: &String, b: &String| a.to_lowercase() < b.to_lowercase());
    let r = ArrayMap::try_from_iter_with([("a".to_string(), 1), ("A".to_string(), 2)], caseless);
    assert_eq!(r.err(), Some(Error::DuplicateKey));
}
