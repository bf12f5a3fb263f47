//! OrderedSet: insertion-ordered hash set over `CoreMap<T, ()>`.
//!
//! This is the container produced by view algebra; it is also a plain set
//! in its own right.

use crate::core_map::{self, CoreMap};
use crate::error::MapError;
use crate::views::{self, set_operators, FiniteSet};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use std::collections::hash_map::RandomState;

#[derive(Clone)]
pub struct OrderedSet<T, S = RandomState> {
    map: CoreMap<T, (), S>,
}

impl<T> OrderedSet<T>
where
    T: Eq + Hash,
{
    pub fn new() -> Self {
        Self { map: CoreMap::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: CoreMap::with_capacity(capacity),
        }
    }
}

impl<T, S: Default> Default for OrderedSet<T, S> {
    fn default() -> Self {
        Self {
            map: CoreMap::default(),
        }
    }
}

impl<T, S> OrderedSet<T, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            map: CoreMap::with_hasher(hasher),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.map.iter(),
        }
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Remove and return the most recently inserted element.
    pub fn pop(&mut self) -> Result<T, MapError> {
        self.map.pop_item().map(|(elem, ())| elem)
    }
}

impl<T, S> OrderedSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    /// Returns `false` if an equal element was already present; the stored
    /// element is kept in that case.
    pub fn insert(&mut self, elem: T) -> bool {
        self.map.set(elem, ()).is_none()
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(q)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.get_key_value(q).map(|(elem, _)| elem)
    }

    /// Remove `q`, failing with `KeyNotFound` when it is absent.
    pub fn remove<Q>(&mut self, q: &Q) -> Result<(), MapError>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.delete(q)
    }

    /// Remove `q` if present; reports whether anything was removed.
    pub fn discard<Q>(&mut self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.remove_entry(q).is_some()
    }
}

impl<T, S> OrderedSet<T, S>
where
    T: Eq + Hash + Clone,
    S: BuildHasher,
{
    pub fn union<R>(&self, other: &R) -> OrderedSet<T>
    where
        R: FiniteSet<Elem = T> + ?Sized,
    {
        views::union(self, other)
    }

    pub fn intersection<R>(&self, other: &R) -> OrderedSet<T>
    where
        R: FiniteSet<Elem = T> + ?Sized,
    {
        views::intersection(self, other)
    }

    pub fn difference<R>(&self, other: &R) -> OrderedSet<T>
    where
        R: FiniteSet<Elem = T> + ?Sized,
    {
        views::difference(self, other)
    }

    pub fn symmetric_difference<R>(&self, other: &R) -> OrderedSet<T>
    where
        R: FiniteSet<Elem = T> + ?Sized,
    {
        views::symmetric_difference(self, other)
    }

    pub fn is_disjoint<R>(&self, other: &R) -> bool
    where
        R: FiniteSet<Elem = T> + ?Sized,
    {
        views::is_disjoint(self, other)
    }

    pub fn is_subset<R>(&self, other: &R) -> bool
    where
        R: FiniteSet<Elem = T> + ?Sized,
    {
        views::is_subset(self, other)
    }

    pub fn is_superset<R>(&self, other: &R) -> bool
    where
        R: FiniteSet<Elem = T> + ?Sized,
    {
        views::is_subset(other, self)
    }
}

impl<T, S> FiniteSet for OrderedSet<T, S>
where
    T: Eq + Hash + Clone,
    S: BuildHasher,
{
    type Elem = T;
    type Elems<'s> = core::iter::Cloned<Iter<'s, T>> where Self: 's;

    fn size(&self) -> usize {
        self.len()
    }

    fn has(&self, elem: &T) -> bool {
        self.contains(elem)
    }

    fn elems(&self) -> Self::Elems<'_> {
        self.iter().cloned()
    }
}

impl<'a, T, S> FiniteSet for &'a OrderedSet<T, S>
where
    T: Eq + Hash + Clone,
    S: BuildHasher,
{
    type Elem = T;
    type Elems<'s> = core::iter::Cloned<Iter<'a, T>> where Self: 's;

    fn size(&self) -> usize {
        self.len()
    }

    fn has(&self, elem: &T) -> bool {
        self.contains(elem)
    }

    fn elems(&self) -> Self::Elems<'_> {
        (*self).iter().cloned()
    }
}

set_operators!(impl['a, T, S] for &'a OrderedSet<T, S>);
set_operators!(impl[T, S] for OrderedSet<T, S>);

impl<T, S1, S2> PartialEq<OrderedSet<T, S2>> for OrderedSet<T, S1>
where
    T: Eq + Hash,
    S1: BuildHasher,
    S2: BuildHasher,
{
    /// Order-insensitive.
    fn eq(&self, other: &OrderedSet<T, S2>) -> bool {
        self.map == other.map
    }
}

impl<T: Eq + Hash, S: BuildHasher> Eq for OrderedSet<T, S> {}

impl<T: fmt::Debug, S> fmt::Debug for OrderedSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S> FromIterator<T> for OrderedSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::with_hasher(S::default());
        set.extend(iter);
        set
    }
}

impl<T, S> Extend<T> for OrderedSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for elem in iter {
            self.insert(elem);
        }
    }
}

impl<T, const N: usize> From<[T; N]> for OrderedSet<T>
where
    T: Eq + Hash,
{
    fn from(arr: [T; N]) -> Self {
        arr.into_iter().collect()
    }
}

pub struct Iter<'a, T> {
    inner: core_map::Iter<'a, T, ()>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.inner.next().map(|(elem, _)| elem)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(elem, _)| elem)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

pub struct IntoIter<T> {
    inner: core_map::IntoIter<T, ()>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.next().map(|(elem, ())| elem)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.inner.next_back().map(|(elem, ())| elem)
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T, S> IntoIterator for OrderedSet<T, S> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter {
            inner: self.map.into_iter(),
        }
    }
}

impl<'a, T, S> IntoIterator for &'a OrderedSet<T, S> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
