// CoreMap integration suite.
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Order: iteration follows first insertion; overwrites keep position.
// - Equality: lookups resolve by Eq + Hash, never identity.
// - Absence: plain accessors return None; try_get/delete return KeyNotFound.
// - Handles: generational; stale handles never resolve.
// - Default-on-miss: get_or_insert_with runs its constructor only on miss.
use seqmap::{CoreMap, MapError};
use std::collections::hash_map::DefaultHasher;
use std::hash::{BuildHasherDefault, Hash, Hasher};

// Test: overwrite semantics.
// Assumes: `set` on an existing key replaces the value in place.
// Verifies: len and position unchanged, final value is the last write.
#[test]
fn overwrite_keeps_len_and_position() {
    let mut m = CoreMap::new();
    for (k, v) in [("first", 10), ("second", 20), ("third", 30)] {
        m.set(k.to_string(), v);
    }
    assert_eq!(m.set("second".to_string(), 200), Some(20));
    assert_eq!(m.set("second".to_string(), 2000), Some(200));
    assert_eq!(m.len(), 3);
    let order: Vec<_> = m.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    assert_eq!(order, [("first", 10), ("second", 2000), ("third", 30)]);
}

// Test: equality-based lookup for user-defined keys.
// Assumes: two distinct values with equal fields hash and compare equal.
// Verifies: both resolve to one entry; a differing field is a different key.
#[test]
fn user_defined_keys_resolve_by_equality() {
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Person {
        name: String,
        age: u32,
    }
    let john = Person { name: "John".into(), age: 78 };
    let john_again = john.clone();
    let younger = Person { name: "John".into(), age: 25 };

    let mut m = CoreMap::new();
    m.set(john, "Senior");
    assert_eq!(m.get(&john_again), Some(&"Senior"));
    assert_eq!(m.get(&younger), None);
    m.set(younger.clone(), "Junior");
    assert_eq!(m.len(), 2);
    assert_eq!(m.try_get(&younger), Ok(&"Junior"));
}

// Test: hashing contract under a custom hasher.
// Assumes: the map hashes with the supplied BuildHasher.
// Verifies: equal keys hash equally and lookups agree with a std-hashed map.
#[test]
fn custom_hasher_is_used() {
    type Fixed = BuildHasherDefault<DefaultHasher>;
    let mut m: CoreMap<&str, usize, Fixed> = CoreMap::with_hasher(Fixed::default());
    for (i, w) in ["alpha", "beta", "gamma"].into_iter().enumerate() {
        m.set(w, i);
    }
    let h = |s: &str| {
        let mut st = DefaultHasher::new();
        s.hash(&mut st);
        st.finish()
    };
    assert_eq!(h("beta"), h(&String::from("beta")));
    assert_eq!(m.get("beta"), Some(&1));
    assert_eq!(m.get(String::from("gamma").as_str()), Some(&2));
}

// Test: absent keys are explicit.
// Assumes: nothing is defaulted by CoreMap reads.
// Verifies: None / KeyNotFound, and the map is unchanged by failed calls.
#[test]
fn absent_key_reporting() {
    let mut m = CoreMap::from([("a", 1)]);
    assert_eq!(m.get("zz"), None);
    assert_eq!(m.get_key_value("zz"), None);
    assert_eq!(m.try_get("zz"), Err(MapError::KeyNotFound));
    assert_eq!(m.delete("zz"), Err(MapError::KeyNotFound));
    assert_eq!(m.remove_entry("zz"), None);
    assert_eq!(m, CoreMap::from([("a", 1)]));
}

// Test: grouping with default-on-miss.
// Assumes: get_or_insert_with inserts at the back on a miss only.
// Verifies: groups collect in first-seen key order.
#[test]
fn default_on_miss_groups() {
    let people = [("John", "blue"), ("Jill", "green"), ("Jack", "blue"), ("Eric", "red")];
    let mut by_colour: CoreMap<&str, Vec<&str>> = CoreMap::new();
    for (name, colour) in people {
        by_colour.get_or_insert_with(colour, Vec::new).push(name);
    }
    let groups: Vec<_> = by_colour.iter().map(|(c, ns)| (*c, ns.clone())).collect();
    assert_eq!(
        groups,
        [
            ("blue", vec!["John", "Jack"]),
            ("green", vec!["Jill"]),
            ("red", vec!["Eric"]),
        ]
    );
}

// Test: handle lifecycle.
// Assumes: handles are slotmap keys with generations.
// Verifies: live handle reads/writes; removal makes it stale even after reuse.
#[test]
fn handles_follow_entry_lifetime() {
    let mut m: CoreMap<String, i32> = CoreMap::new();
    m.set("x".into(), 1);
    let h = m.find("x").expect("present");
    *h.value_mut(&mut m).expect("live") = 7;
    assert_eq!(m.get("x"), Some(&7));
    assert_eq!(h.sequence(&m), m.sequence_of("x"));

    m.delete("x").unwrap();
    m.set("x".into(), 8);
    assert!(h.value(&m).is_none());
    assert!(h.key(&m).is_none());
    assert_ne!(m.find("x"), Some(h));
}

// Test: construction surfaces.
// Verifies: arrays, iterators and extend agree on order and contents.
#[test]
fn construction_surfaces_agree() {
    let from_array = CoreMap::from([("a", 1), ("b", 2)]);
    let collected: CoreMap<_, _> = vec![("a", 1), ("b", 2)].into_iter().collect();
    let mut extended = CoreMap::new();
    extended.extend([("a", 1), ("b", 2)]);
    let with_cap: CoreMap<&str, i32> = CoreMap::with_capacity(16);
    assert!(with_cap.capacity() >= 16);
    for m in [&collected, &extended] {
        assert_eq!(m.iter().collect::<Vec<_>>(), from_array.iter().collect::<Vec<_>>());
    }
    assert_eq!(CoreMap::<&str, i32>::default().len(), 0);
}

// Test: iteration order survives many removals and reinsertions.
// Verifies: surviving keys keep relative order, reinserted keys go last.
#[test]
fn churn_preserves_relative_order() {
    let mut m: CoreMap<u32, u32> = (0..100).map(|i| (i, i)).collect();
    for i in (0..100).filter(|i| i % 3 == 0) {
        m.delete(&i).unwrap();
    }
    for i in [0, 3, 6] {
        m.set(i, i);
    }
    let keys: Vec<u32> = m.keys().iter().copied().collect();
    let mut expected: Vec<u32> = (0..100).filter(|i| i % 3 != 0).collect();
    expected.extend([0, 3, 6]);
    assert_eq!(keys, expected);
}

// Test: chained key-view algebra across three maps.
// Assumes: a view operator yields an OrderedSet that accepts further operators.
// Verifies: keys not shared by every map, with their per-map counts.
#[test]
fn chained_view_algebra_finds_uneven_keys() {
    let n1 = CoreMap::from([("employees", 100), ("employee", 5000), ("users", 10), ("user", 100)]);
    let n2 = CoreMap::from([("employees", 250), ("users", 23), ("user", 230)]);
    let n3 = CoreMap::from([("employees", 150), ("users", 4), ("login", 1000)]);

    let union = n1.keys() | n2.keys() | n3.keys();
    let intersection = n1.keys() & n2.keys() & n3.keys();
    assert_eq!(
        union.iter().copied().collect::<Vec<_>>(),
        ["employees", "employee", "users", "user", "login"]
    );
    assert_eq!(intersection.iter().copied().collect::<Vec<_>>(), ["employees", "users"]);

    let relevant = union - intersection;
    let counts: Vec<(&str, (i32, i32, i32))> = relevant
        .iter()
        .map(|k| {
            let at = |m: &CoreMap<&str, i32>| m.get(k).copied().unwrap_or(0);
            (*k, (at(&n1), at(&n2), at(&n3)))
        })
        .collect();
    assert_eq!(
        counts,
        [
            ("employee", (5000, 0, 0)),
            ("user", (100, 230, 0)),
            ("login", (0, 0, 1000)),
        ]
    );
    assert!((n1.keys() ^ n2.keys() ^ n3.keys()).contains(&"login"));
}
