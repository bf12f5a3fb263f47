//! LayeredMap: an ordered stack of shared maps queried as one.
//!
//! Reads scan the layers front to back and return the first hit. Writes and
//! deletes touch the first layer only, so a write shadows deeper values and
//! a delete can let a deeper value resurface.
//!
//! Layers are `Rc<RefCell<CoreMap>>` handles and are never copied: a change
//! made through any other handle to a layer is visible here, and
//! `new_child`/`parents` share the existing layers. The type is therefore
//! single-threaded (`!Send`). Write paths borrow the first layer with
//! `try_borrow_mut` and report an outstanding borrow as
//! `MapError::ConcurrentModification`. `try_get` reports the same error;
//! the other read paths panic if a layer is mutably borrowed elsewhere, like
//! any `RefCell`.

use crate::core_map::CoreMap;
use crate::error::MapError;
use crate::ordered_set::OrderedSet;
use core::cell::{Ref, RefCell, RefMut};
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;
use std::rc::Rc;

/// A map that can be shared between several layered maps and other owners.
pub type Layer<K, V, S = RandomState> = Rc<RefCell<CoreMap<K, V, S>>>;

/// Wrap `map` into a shareable layer.
pub fn layer<K, V, S>(map: CoreMap<K, V, S>) -> Layer<K, V, S> {
    Rc::new(RefCell::new(map))
}

pub struct LayeredMap<K, V, S = RandomState> {
    maps: Vec<Layer<K, V, S>>,
}

impl<K, V> LayeredMap<K, V>
where
    K: Eq + Hash,
{
    /// A stack holding one empty layer.
    pub fn new() -> Self {
        Self {
            maps: vec![layer(CoreMap::new())],
        }
    }
}

impl<K, V, S: Default> Default for LayeredMap<K, V, S> {
    fn default() -> Self {
        Self {
            maps: vec![layer(CoreMap::default())],
        }
    }
}

impl<K, V, S> Clone for LayeredMap<K, V, S> {
    /// Shallow: the clone shares every layer with `self`.
    fn clone(&self) -> Self {
        Self {
            maps: self.maps.clone(),
        }
    }
}

impl<K, V, S> LayeredMap<K, V, S> {
    /// Share `layers`; an empty list yields a single empty layer.
    pub fn from_layers(layers: Vec<Layer<K, V, S>>) -> Self
    where
        S: Default,
    {
        if layers.is_empty() {
            return Self::default();
        }
        Self { maps: layers }
    }

    pub fn from_maps<I>(maps: I) -> Self
    where
        I: IntoIterator<Item = CoreMap<K, V, S>>,
        S: Default,
    {
        Self::from_layers(maps.into_iter().map(layer).collect())
    }

    pub fn maps(&self) -> &[Layer<K, V, S>] {
        &self.maps
    }

    /// The layer list itself; callers may push, insert or remove layers.
    pub fn maps_mut(&mut self) -> &mut Vec<Layer<K, V, S>> {
        &mut self.maps
    }

    /// A new stack with `child` in front of all of `self`'s layers.
    pub fn new_child(&self, child: Layer<K, V, S>) -> Self {
        let mut maps = Vec::with_capacity(self.maps.len() + 1);
        maps.push(child);
        maps.extend(self.maps.iter().cloned());
        tracing::debug!(depth = maps.len(), "layered map derived child");
        Self { maps }
    }

    pub fn new_empty_child(&self) -> Self
    where
        S: Default,
    {
        self.new_child(layer(CoreMap::default()))
    }

    /// A new stack over every layer but the first.
    pub fn parents(&self) -> Self
    where
        S: Default,
    {
        let parents = Self::from_layers(self.maps.iter().skip(1).cloned().collect());
        tracing::debug!(depth = parents.maps.len(), "layered map derived parents");
        parents
    }

    fn first_mut(&self) -> Result<RefMut<'_, CoreMap<K, V, S>>, MapError> {
        self.maps
            .first()
            .ok_or(MapError::EmptyContainer)?
            .try_borrow_mut()
            .map_err(|_| MapError::ConcurrentModification)
    }

    /// Remove the newest entry of the first layer.
    pub fn pop_item(&mut self) -> Result<(K, V), MapError> {
        self.first_mut()?.pop_item()
    }

    /// Empty the first layer; deeper layers are untouched.
    pub fn clear(&mut self) -> Result<(), MapError> {
        self.first_mut()?.clear();
        Ok(())
    }
}

impl<K, V, S> LayeredMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn get<Q>(&self, q: &Q) -> Option<Ref<'_, V>>
    where
        K: core::borrow::Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.maps
            .iter()
            .find_map(|m| Ref::filter_map(m.borrow(), |map| map.get(q)).ok())
    }

    pub fn get_cloned<Q>(&self, q: &Q) -> Option<V>
    where
        K: core::borrow::Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.get(q).map(|v| v.clone())
    }

    /// Like `get`, but never panics: a layer mutably borrowed elsewhere is
    /// reported as `ConcurrentModification`.
    pub fn try_get<Q>(&self, q: &Q) -> Result<Ref<'_, V>, MapError>
    where
        K: core::borrow::Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        for m in &self.maps {
            let guard = m.try_borrow().map_err(|_| MapError::ConcurrentModification)?;
            if let Ok(v) = Ref::filter_map(guard, |map| map.get(q)) {
                return Ok(v);
            }
        }
        Err(MapError::KeyNotFound)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: core::borrow::Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.maps.iter().any(|m| m.borrow().contains_key(q))
    }

    /// Write into the first layer, shadowing any deeper value.
    pub fn set(&mut self, key: K, value: V) -> Result<Option<V>, MapError> {
        Ok(self.first_mut()?.set(key, value))
    }

    /// Delete from the first layer only. A key held solely by deeper layers
    /// is reported as `KeyNotFound` and left in place.
    pub fn delete<Q>(&mut self, q: &Q) -> Result<V, MapError>
    where
        K: core::borrow::Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.first_mut()?.delete(q)
    }

    /// Number of distinct keys across all layers.
    pub fn len(&self) -> usize {
        let guards: Vec<Ref<'_, CoreMap<K, V, S>>> = self.maps.iter().map(|m| m.borrow()).collect();
        let mut seen: hashbrown::HashSet<&K> = hashbrown::HashSet::new();
        for g in &guards {
            seen.extend(g.keys());
        }
        seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.iter().all(|m| m.borrow().is_empty())
    }

    /// Distinct keys, in order of first appearance from the deepest layer up.
    pub fn keys(&self) -> OrderedSet<K>
    where
        K: Clone,
    {
        let mut out = OrderedSet::new();
        for m in self.maps.iter().rev() {
            out.extend(m.borrow().keys().iter().cloned());
        }
        out
    }

    /// Flatten into one map: key order as in [`keys`](Self::keys), each
    /// value taken from the first layer holding the key.
    pub fn to_map(&self) -> CoreMap<K, V, S>
    where
        K: Clone,
        V: Clone,
        S: Default,
    {
        let mut out = CoreMap::with_hasher(S::default());
        for m in self.maps.iter().rev() {
            for (k, v) in m.borrow().iter() {
                out.set(k.clone(), v.clone());
            }
        }
        out
    }

    pub fn items(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
        S: Default,
    {
        self.to_map().into_iter().collect()
    }

    pub fn values(&self) -> Vec<V>
    where
        K: Clone,
        V: Clone,
        S: Default,
    {
        self.to_map().into_iter().map(|(_, v)| v).collect()
    }
}

impl<K, V, S> PartialEq for LayeredMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    /// Compares the flattened maps.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.maps.iter().all(|m| {
                m.borrow()
                    .keys()
                    .iter()
                    .all(|k| match (self.get(k), other.get(k)) {
                        (Some(a), Some(b)) => *a == *b,
                        _ => false,
                    })
            })
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for LayeredMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LayeredMap")?;
        f.debug_list()
            .entries(self.maps.iter().map(|m| m.borrow()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_layers() -> (LayeredMap<&'static str, i32>, Layer<&'static str, i32>, Layer<&'static str, i32>) {
        let front = layer(CoreMap::from([("a", 1), ("b", 2)]));
        let back = layer(CoreMap::from([("b", 20), ("c", 3)]));
        let chain = LayeredMap::from_layers(vec![front.clone(), back.clone()]);
        (chain, front, back)
    }

    /// Invariant: reads return the first hit; writes land in the first
    /// layer and shadow instead of updating deeper layers.
    #[test]
    fn reads_scan_writes_shadow() {
        let (mut chain, front, back) = two_layers();
        assert_eq!(chain.get_cloned("b"), Some(2));
        assert_eq!(chain.get_cloned("c"), Some(3));

        chain.set("c", 99).unwrap();
        assert_eq!(*front.borrow(), CoreMap::from([("a", 1), ("b", 2), ("c", 99)]));
        assert_eq!(*back.borrow(), CoreMap::from([("b", 20), ("c", 3)]));
        assert_eq!(chain.get_cloned("c"), Some(99));
    }

    /// Invariant: deletes are layer-local; a deeper value resurfaces.
    #[test]
    fn delete_is_layer_local() {
        let (mut chain, _front, back) = two_layers();
        assert_eq!(chain.delete("a"), Ok(1));
        assert_eq!(chain.try_get("a").err(), Some(MapError::KeyNotFound));

        assert_eq!(chain.delete("b"), Ok(2));
        assert_eq!(chain.get_cloned("b"), Some(20));

        // Only deeper layers hold "c": the first layer reports it missing.
        assert_eq!(chain.delete("c"), Err(MapError::KeyNotFound));
        assert_eq!(back.borrow().get("c"), Some(&3));
    }

    /// Invariant: layers are shared; outside mutation shows through.
    #[test]
    fn layers_are_referenced_not_copied() {
        let (chain, front, back) = two_layers();
        back.borrow_mut().set("d", 4);
        front.borrow_mut().set("a", 100);
        assert_eq!(chain.get_cloned("d"), Some(4));
        assert_eq!(chain.get_cloned("a"), Some(100));
        assert_eq!(chain.len(), 4);
    }

    /// Invariant: `new_child` prepends and shares; `parents` drops the first.
    #[test]
    fn child_and_parents_share_layers() {
        let (chain, front, _back) = two_layers();
        let mut child = chain.new_empty_child();
        assert_eq!(child.maps().len(), 3);
        child.set("a", -1).unwrap();
        assert_eq!(child.get_cloned("a"), Some(-1));
        assert_eq!(chain.get_cloned("a"), Some(1));

        front.borrow_mut().set("z", 26);
        assert_eq!(child.get_cloned("z"), Some(26));

        let parents = child.parents();
        assert_eq!(parents.maps().len(), 2);
        assert!(Rc::ptr_eq(&parents.maps()[0], &front));
        assert_eq!(parents.get_cloned("a"), Some(1));
    }

    /// Invariant: the layer list is caller-editable.
    #[test]
    fn maps_list_is_mutable() {
        let (mut chain, _front, _back) = two_layers();
        chain.maps_mut().insert(0, layer(CoreMap::from([("a", 100)])));
        assert_eq!(chain.get_cloned("a"), Some(100));
        chain.maps_mut().remove(1);
        assert_eq!(chain.get_cloned("b"), Some(20));
        chain.maps_mut().push(layer(CoreMap::from([("e", 5)])));
        assert_eq!(chain.get_cloned("e"), Some(5));

        chain.maps_mut().clear();
        assert_eq!(chain.set("x", 1), Err(MapError::EmptyContainer));
        assert!(chain.get("x").is_none());
        assert_eq!(LayeredMap::<&str, i32>::from_layers(Vec::new()).maps().len(), 1);
    }

    /// Invariant: flattening keeps first-seen order from the deepest layer
    /// and takes values from the earliest layer.
    #[test]
    fn flatten_order_and_precedence() {
        let (chain, _front, _back) = two_layers();
        assert_eq!(chain.items(), vec![("b", 2), ("c", 3), ("a", 1)]);
        assert_eq!(chain.keys().iter().copied().collect::<Vec<_>>(), ["b", "c", "a"]);
        assert_eq!(chain.values(), vec![2, 3, 1]);
        assert_eq!(chain.to_map(), CoreMap::from([("a", 1), ("b", 2), ("c", 3)]));
    }

    /// Invariant: a write while the first layer is borrowed elsewhere fails
    /// fast instead of panicking.
    #[test]
    fn write_during_outside_borrow_fails_fast() {
        let (mut chain, front, _back) = two_layers();
        let held = front.borrow();
        assert_eq!(chain.set("q", 0), Err(MapError::ConcurrentModification));
        assert_eq!(chain.delete("a"), Err(MapError::ConcurrentModification));
        drop(held);
        assert_eq!(chain.set("q", 0), Ok(None));
    }

    #[test]
    fn equality_compares_flattened_view() {
        let (chain, _front, _back) = two_layers();
        let flat = LayeredMap::from_maps([CoreMap::from([("c", 3), ("b", 2), ("a", 1)])]);
        assert_eq!(chain, flat);
        let other = LayeredMap::from_maps([CoreMap::from([("a", 1), ("b", 20), ("c", 3)])]);
        assert_ne!(chain, other);
    }
}
