//! OrderedMap: `CoreMap` plus positional pops and moves, with
//! order-sensitive equality.

use crate::core_map::{CoreMap, Iter, IterMut};
use crate::error::MapError;
use crate::views::{Items, Keys, Values};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::ops::Index;
use std::collections::hash_map::RandomState;

/// Two `OrderedMap`s are equal only if they hold equal pairs in the same
/// order. Against a plain `CoreMap` the comparison ignores order.
#[derive(Clone)]
pub struct OrderedMap<K, V, S = RandomState> {
    inner: CoreMap<K, V, S>,
}

impl<K, V> OrderedMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            inner: CoreMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: CoreMap::with_capacity(capacity),
        }
    }
}

impl<K, V, S: Default> Default for OrderedMap<K, V, S> {
    fn default() -> Self {
        Self {
            inner: CoreMap::default(),
        }
    }
}

impl<K, V, S> OrderedMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            inner: CoreMap::with_hasher(hasher),
        }
    }

    pub fn as_map(&self) -> &CoreMap<K, V, S> {
        &self.inner
    }

    pub fn into_inner(self) -> CoreMap<K, V, S> {
        self.inner
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.inner.first()
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        self.inner.last()
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        self.inner.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.inner.iter_mut()
    }

    pub fn keys(&self) -> Keys<'_, K, V, S> {
        self.inner.keys()
    }

    pub fn values(&self) -> Values<'_, K, V, S> {
        self.inner.values()
    }

    pub fn items(&self) -> Items<'_, K, V, S> {
        self.inner.items()
    }

    pub fn pop_last(&mut self) -> Result<(K, V), MapError> {
        let popped = self.inner.pop_back().ok_or(MapError::EmptyContainer)?;
        tracing::trace!(remaining = self.len(), "ordered map popped last entry");
        Ok(popped)
    }

    pub fn pop_first(&mut self) -> Result<(K, V), MapError> {
        let popped = self.inner.pop_front().ok_or(MapError::EmptyContainer)?;
        tracing::trace!(remaining = self.len(), "ordered map popped first entry");
        Ok(popped)
    }

    /// `pop_last` when `last` is true, `pop_first` otherwise.
    pub fn pop_item(&mut self, last: bool) -> Result<(K, V), MapError> {
        if last {
            self.pop_last()
        } else {
            self.pop_first()
        }
    }
}

impl<K, V, S> OrderedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.get(q)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.get_mut(q)
    }

    pub fn try_get<Q>(&self, q: &Q) -> Result<&V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.try_get(q)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.contains_key(q)
    }

    /// See [`CoreMap::set`]: an existing key keeps its position.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        self.inner.set(key, value)
    }

    pub fn delete<Q>(&mut self, q: &Q) -> Result<V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.delete(q)
    }

    /// Move `key` to the end of the iteration order.
    pub fn move_to_back<Q>(&mut self, q: &Q) -> Result<(), MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.inner.move_back(q) {
            Ok(())
        } else {
            Err(MapError::KeyNotFound)
        }
    }

    /// Move `key` to the start of the iteration order.
    pub fn move_to_front<Q>(&mut self, q: &Q) -> Result<(), MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.inner.move_front(q) {
            Ok(())
        } else {
            Err(MapError::KeyNotFound)
        }
    }

    pub fn move_to_end<Q>(&mut self, q: &Q, last: bool) -> Result<(), MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if last {
            self.move_to_back(q)
        } else {
            self.move_to_front(q)
        }
    }
}

impl<K, V, S1, S2> PartialEq<OrderedMap<K, V, S2>> for OrderedMap<K, V, S1>
where
    K: Eq,
    V: PartialEq,
{
    fn eq(&self, other: &OrderedMap<K, V, S2>) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|((k1, v1), (k2, v2))| k1 == k2 && v1 == v2)
    }
}

impl<K: Eq, V: Eq, S> Eq for OrderedMap<K, V, S> {}

impl<K, V, S1, S2> PartialEq<CoreMap<K, V, S2>> for OrderedMap<K, V, S1>
where
    K: Eq + Hash,
    V: PartialEq,
    S1: BuildHasher,
    S2: BuildHasher,
{
    fn eq(&self, other: &CoreMap<K, V, S2>) -> bool {
        self.inner == *other
    }
}

impl<K, V, S1, S2> PartialEq<OrderedMap<K, V, S2>> for CoreMap<K, V, S1>
where
    K: Eq + Hash,
    V: PartialEq,
    S1: BuildHasher,
    S2: BuildHasher,
{
    fn eq(&self, other: &OrderedMap<K, V, S2>) -> bool {
        *self == other.inner
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for OrderedMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OrderedMap")?;
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<K, Q, V, S> Index<&Q> for OrderedMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        &self.inner[key]
    }
}

impl<K, V, S> From<CoreMap<K, V, S>> for OrderedMap<K, V, S> {
    fn from(inner: CoreMap<K, V, S>) -> Self {
        Self { inner }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for OrderedMap<K, V>
where
    K: Eq + Hash,
{
    fn from(arr: [(K, V); N]) -> Self {
        Self {
            inner: CoreMap::from(arr),
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for OrderedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl<K, V, S> Extend<(K, V)> for OrderedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.inner.extend(iter);
    }
}

impl<K, V, S> IntoIterator for OrderedMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = crate::core_map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a OrderedMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}
