// LayeredMap integration suite.
//
// Invariants exercised:
// - Reads scan layers front to back; writes and deletes touch layer 0 only.
// - Layers are shared by reference; outside edits show through.
// - new_child/parents share layers instead of copying them.
// - Write paths and try_get fail fast with ConcurrentModification on a borrowed layer.
use seqmap::{layer, CoreMap, LayeredMap, MapError};

// Test: the shadowing / layer-local delete scenario.
// Given layers [{a:1,b:2}, {b:20,c:3}]:
// - get(b) == 2
// - set(c, 99) lands in layer 0, layer 1 unchanged
// - delete(a) then get(a) is KeyNotFound
// - delete(b) then get(b) == 20 (resurfaces from layer 1)
#[test]
fn shadowing_and_layer_local_delete() {
    let first = layer(CoreMap::from([("a", 1), ("b", 2)]));
    let second = layer(CoreMap::from([("b", 20), ("c", 3)]));
    let mut chain = LayeredMap::from_layers(vec![first.clone(), second.clone()]);

    assert_eq!(chain.get_cloned("b"), Some(2));

    chain.set("c", 99).unwrap();
    assert_eq!(*first.borrow(), CoreMap::from([("a", 1), ("b", 2), ("c", 99)]));
    assert_eq!(
        first.borrow().keys().iter().copied().collect::<Vec<_>>(),
        ["a", "b", "c"]
    );
    assert_eq!(*second.borrow(), CoreMap::from([("b", 20), ("c", 3)]));

    chain.delete("a").unwrap();
    assert_eq!(chain.try_get("a").err(), Some(MapError::KeyNotFound));

    chain.delete("b").unwrap();
    assert_eq!(chain.get_cloned("b"), Some(20));
}

// Test: command-line style precedence (cli > env > defaults).
// Verifies: lookups pick the first layer that has the key; items union.
#[test]
fn configuration_precedence() {
    let defaults = layer(CoreMap::from([("theme", "Default"), ("language", "English"), ("showIndex", "True")]));
    let env = layer(CoreMap::from([("language", "Spanish")]));
    let cli = layer(CoreMap::from([("theme", "Dark")]));
    let config = LayeredMap::from_layers(vec![cli, env, defaults.clone()]);

    assert_eq!(config.get_cloned("theme"), Some("Dark"));
    assert_eq!(config.get_cloned("language"), Some("Spanish"));
    assert_eq!(config.get_cloned("showIndex"), Some("True"));
    assert_eq!(config.len(), 3);

    defaults.borrow_mut().set("showIndex", "False");
    assert_eq!(config.get_cloned("showIndex"), Some("False"));
    assert_eq!(
        config.items(),
        vec![("theme", "Dark"), ("language", "Spanish"), ("showIndex", "False")]
    );
}

// Test: scoped lookup with new_child.
// Verifies: writes in the child are invisible to the parent; the parent's
// later edits are visible in the child.
#[test]
fn nested_scopes() {
    let mut globals: LayeredMap<&str, i32> = LayeredMap::new();
    globals.set("x", 1).unwrap();
    let mut local = globals.new_empty_child();
    local.set("x", 2).unwrap();
    local.set("y", 3).unwrap();
    assert_eq!(local.get_cloned("x"), Some(2));
    assert_eq!(globals.get_cloned("x"), Some(1));
    assert!(!globals.contains_key("y"));

    globals.set("z", 4).unwrap();
    assert_eq!(local.get_cloned("z"), Some(4));
    assert_eq!(local.parents(), globals);

    let deeper = local.new_child(layer(CoreMap::from([("y", 30)])));
    assert_eq!(deeper.get_cloned("y"), Some(30));
    assert_eq!(deeper.parents().get_cloned("y"), Some(3));
}

// Test: clearing and popping only affect the first layer.
#[test]
fn clear_and_pop_are_first_layer_only() {
    let mut chain = LayeredMap::from_maps([
        CoreMap::from([("a", 1), ("b", 2)]),
        CoreMap::from([("c", 3)]),
    ]);
    assert_eq!(chain.pop_item(), Ok(("b", 2)));
    chain.clear().unwrap();
    assert_eq!(chain.pop_item(), Err(MapError::EmptyContainer));
    assert_eq!(chain.len(), 1);
    assert!(chain.contains_key("c"));
    assert!(!chain.is_empty());
}

// Test: borrow conflicts on the first layer.
// Verifies: a Ref held through a shared clone blocks writes with an error.
#[test]
fn held_reference_blocks_writes() {
    let mut chain: LayeredMap<&str, i32> = LayeredMap::from_maps([CoreMap::from([("a", 1)])]);
    let reader = chain.clone();
    let value = reader.get("a").expect("present");
    assert_eq!(*value, 1);
    assert_eq!(chain.set("a", 2), Err(MapError::ConcurrentModification));
    assert_eq!(chain.pop_item(), Err(MapError::ConcurrentModification));
    assert_eq!(chain.clear(), Err(MapError::ConcurrentModification));
    drop(value);
    assert_eq!(chain.set("a", 2), Ok(Some(1)));
}

// Test: try_get against a layer mutably borrowed elsewhere.
// Verifies: hits above the borrowed layer resolve; scans reaching it
// report ConcurrentModification instead of panicking.
#[test]
fn try_get_reports_borrowed_layer() {
    let chain: LayeredMap<&str, i32> =
        LayeredMap::from_maps([CoreMap::from([("top", 1)]), CoreMap::from([("deep", 2)])]);
    let writer = chain.clone();
    let mut held = writer.maps()[1].borrow_mut();
    assert_eq!(chain.try_get("top").map(|v| *v), Ok(1));
    assert_eq!(chain.try_get("deep").err(), Some(MapError::ConcurrentModification));
    assert_eq!(chain.try_get("nowhere").err(), Some(MapError::ConcurrentModification));
    held.set("deep", 20);
    drop(held);
    assert_eq!(chain.try_get("deep").map(|v| *v), Ok(20));
    assert_eq!(chain.try_get("nowhere").err(), Some(MapError::KeyNotFound));
}

// Test: Debug lists layers front to back.
#[test]
fn debug_lists_layers() {
    let chain = LayeredMap::from_maps([CoreMap::from([("a", 1)]), CoreMap::from([("b", 2)])]);
    assert_eq!(format!("{chain:?}"), r#"LayeredMap[{"a": 1}, {"b": 2}]"#);
}
