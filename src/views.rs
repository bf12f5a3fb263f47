//! Live views over a `CoreMap` and the set algebra on key and item views.
//!
//! A view is a borrowed `&CoreMap` and nothing else. Every `iter()` starts
//! from the map's current head, so two iterations without a mutation in
//! between yield the same sequence, and a view taken after a mutation sees
//! it. The borrow rules stop the map from being mutated, or dropped, while a
//! view of it is alive.
//!
//! Item views compare whole pairs: `(k, 1)` and `(k, 2)` are different
//! elements, so a union keeps both and an intersection keeps neither.

use crate::core_map::{CoreMap, Iter};
use crate::ordered_set::OrderedSet;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use std::collections::hash_map::RandomState;

/// A finite collection of hashable elements that set algebra can consume.
///
/// `elems` yields owned clones so the result of an operation never borrows
/// from its operands.
pub trait FiniteSet {
    type Elem: Eq + Hash + Clone;
    type Elems<'s>: Iterator<Item = Self::Elem>
    where
        Self: 's;

    fn size(&self) -> usize;
    fn has(&self, elem: &Self::Elem) -> bool;
    fn elems(&self) -> Self::Elems<'_>;
}

/// Elements of `a`, then elements of `b` not already present.
pub fn union<A, B>(a: &A, b: &B) -> OrderedSet<A::Elem>
where
    A: FiniteSet + ?Sized,
    B: FiniteSet<Elem = A::Elem> + ?Sized,
{
    let mut out = OrderedSet::with_capacity(a.size() + b.size());
    out.extend(a.elems());
    out.extend(b.elems());
    out
}

pub fn intersection<A, B>(a: &A, b: &B) -> OrderedSet<A::Elem>
where
    A: FiniteSet + ?Sized,
    B: FiniteSet<Elem = A::Elem> + ?Sized,
{
    a.elems().filter(|e| b.has(e)).collect()
}

pub fn difference<A, B>(a: &A, b: &B) -> OrderedSet<A::Elem>
where
    A: FiniteSet + ?Sized,
    B: FiniteSet<Elem = A::Elem> + ?Sized,
{
    a.elems().filter(|e| !b.has(e)).collect()
}

pub fn symmetric_difference<A, B>(a: &A, b: &B) -> OrderedSet<A::Elem>
where
    A: FiniteSet + ?Sized,
    B: FiniteSet<Elem = A::Elem> + ?Sized,
{
    let mut out = difference(a, b);
    out.extend(b.elems().filter(|e| !a.has(e)));
    out
}

pub fn is_disjoint<A, B>(a: &A, b: &B) -> bool
where
    A: FiniteSet + ?Sized,
    B: FiniteSet<Elem = A::Elem> + ?Sized,
{
    if a.size() <= b.size() {
        a.elems().all(|e| !b.has(&e))
    } else {
        b.elems().all(|e| !a.has(&e))
    }
}

pub fn is_subset<A, B>(a: &A, b: &B) -> bool
where
    A: FiniteSet + ?Sized,
    B: FiniteSet<Elem = A::Elem> + ?Sized,
{
    a.size() <= b.size() && a.elems().all(|e| b.has(&e))
}

/// `|`, `&`, `-` and `^` against any `FiniteSet` with the same element type.
macro_rules! set_operators {
    (impl[$($gen:tt)*] for $ty:ty) => {
        impl<$($gen)*, Rhs> core::ops::BitOr<Rhs> for $ty
        where
            $ty: $crate::views::FiniteSet,
            Rhs: $crate::views::FiniteSet<Elem = <$ty as $crate::views::FiniteSet>::Elem>,
        {
            type Output = $crate::ordered_set::OrderedSet<<$ty as $crate::views::FiniteSet>::Elem>;
            fn bitor(self, rhs: Rhs) -> Self::Output {
                $crate::views::union(&self, &rhs)
            }
        }

        impl<$($gen)*, Rhs> core::ops::BitAnd<Rhs> for $ty
        where
            $ty: $crate::views::FiniteSet,
            Rhs: $crate::views::FiniteSet<Elem = <$ty as $crate::views::FiniteSet>::Elem>,
        {
            type Output = $crate::ordered_set::OrderedSet<<$ty as $crate::views::FiniteSet>::Elem>;
            fn bitand(self, rhs: Rhs) -> Self::Output {
                $crate::views::intersection(&self, &rhs)
            }
        }

        impl<$($gen)*, Rhs> core::ops::Sub<Rhs> for $ty
        where
            $ty: $crate::views::FiniteSet,
            Rhs: $crate::views::FiniteSet<Elem = <$ty as $crate::views::FiniteSet>::Elem>,
        {
            type Output = $crate::ordered_set::OrderedSet<<$ty as $crate::views::FiniteSet>::Elem>;
            fn sub(self, rhs: Rhs) -> Self::Output {
                $crate::views::difference(&self, &rhs)
            }
        }

        impl<$($gen)*, Rhs> core::ops::BitXor<Rhs> for $ty
        where
            $ty: $crate::views::FiniteSet,
            Rhs: $crate::views::FiniteSet<Elem = <$ty as $crate::views::FiniteSet>::Elem>,
        {
            type Output = $crate::ordered_set::OrderedSet<<$ty as $crate::views::FiniteSet>::Elem>;
            fn bitxor(self, rhs: Rhs) -> Self::Output {
                $crate::views::symmetric_difference(&self, &rhs)
            }
        }
    };
}

pub(crate) use set_operators;

impl<K, V, S> CoreMap<K, V, S> {
    pub fn keys(&self) -> Keys<'_, K, V, S> {
        Keys { map: self }
    }

    pub fn values(&self) -> Values<'_, K, V, S> {
        Values { map: self }
    }

    pub fn items(&self) -> Items<'_, K, V, S> {
        Items { map: self }
    }
}

/// Live view of a map's keys.
pub struct Keys<'a, K, V, S = RandomState> {
    map: &'a CoreMap<K, V, S>,
}

/// Live view of a map's values. Iteration only: values need not be
/// hashable or unique, so there is no set algebra here.
pub struct Values<'a, K, V, S = RandomState> {
    map: &'a CoreMap<K, V, S>,
}

/// Live view of a map's `(key, value)` pairs.
pub struct Items<'a, K, V, S = RandomState> {
    map: &'a CoreMap<K, V, S>,
}

macro_rules! view_common {
    ($view:ident, $iter:ident) => {
        impl<K, V, S> Clone for $view<'_, K, V, S> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<K, V, S> Copy for $view<'_, K, V, S> {}

        impl<'a, K, V, S> $view<'a, K, V, S> {
            pub fn len(&self) -> usize {
                self.map.len()
            }

            pub fn is_empty(&self) -> bool {
                self.map.is_empty()
            }

            pub fn iter(&self) -> $iter<'a, K, V> {
                $iter {
                    inner: self.map.iter(),
                }
            }
        }

        impl<'a, K, V, S> IntoIterator for $view<'a, K, V, S> {
            type Item = <$iter<'a, K, V> as Iterator>::Item;
            type IntoIter = $iter<'a, K, V>;

            fn into_iter(self) -> Self::IntoIter {
                self.iter()
            }
        }

        impl<'a, K, V, S> IntoIterator for &$view<'a, K, V, S> {
            type Item = <$iter<'a, K, V> as Iterator>::Item;
            type IntoIter = $iter<'a, K, V>;

            fn into_iter(self) -> Self::IntoIter {
                self.iter()
            }
        }

        impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for $view<'_, K, V, S> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(stringify!($view))?;
                f.debug_list().entries(self.iter()).finish()
            }
        }
    };
}

view_common!(Keys, KeysIter);
view_common!(Values, ValuesIter);
view_common!(Items, ItemsIter);

pub struct KeysIter<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for KeysIter<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for KeysIter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for KeysIter<'_, K, V> {}
impl<K, V> FusedIterator for KeysIter<'_, K, V> {}

pub struct ValuesIter<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesIter<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ValuesIter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for ValuesIter<'_, K, V> {}
impl<K, V> FusedIterator for ValuesIter<'_, K, V> {}

pub struct ItemsIter<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for ItemsIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ItemsIter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for ItemsIter<'_, K, V> {}
impl<K, V> FusedIterator for ItemsIter<'_, K, V> {}

impl<K, V, S> Keys<'_, K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(q)
    }
}

impl<K, V, S> Items<'_, K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    /// True when `key` is present and mapped to a value equal to `value`.
    pub fn contains<Q>(&self, key: &Q, value: &V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.get(key).map_or(false, |v| v == value)
    }
}

impl<'a, K, V, S> FiniteSet for Keys<'a, K, V, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    type Elem = K;
    type Elems<'s> = core::iter::Cloned<KeysIter<'a, K, V>> where Self: 's;

    fn size(&self) -> usize {
        self.map.len()
    }

    fn has(&self, elem: &K) -> bool {
        self.map.contains_key(elem)
    }

    fn elems(&self) -> Self::Elems<'_> {
        self.iter().cloned()
    }
}

fn clone_pair<K: Clone, V: Clone>((k, v): (&K, &V)) -> (K, V) {
    (k.clone(), v.clone())
}

impl<'a, K, V, S> FiniteSet for Items<'a, K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
    S: BuildHasher,
{
    type Elem = (K, V);
    type Elems<'s> = core::iter::Map<ItemsIter<'a, K, V>, fn((&'a K, &'a V)) -> (K, V)>
    where
        Self: 's;

    fn size(&self) -> usize {
        self.map.len()
    }

    fn has(&self, elem: &(K, V)) -> bool {
        self.map.get(&elem.0).map_or(false, |v| *v == elem.1)
    }

    fn elems(&self) -> Self::Elems<'_> {
        self.iter().map(clone_pair as fn((&'a K, &'a V)) -> (K, V))
    }
}

set_operators!(impl['a, K, V, S] for Keys<'a, K, V, S>);
set_operators!(impl['a, K, V, S] for Items<'a, K, V, S>);

/// Named set operations shared by key and item views.
macro_rules! view_algebra {
    ($view:ident, [$($bound:tt)*]) => {
        impl<K, V, S> $view<'_, K, V, S>
        where
            $($bound)*
        {
            pub fn union<R>(&self, other: &R) -> OrderedSet<<Self as FiniteSet>::Elem>
            where
                R: FiniteSet<Elem = <Self as FiniteSet>::Elem> + ?Sized,
            {
                union(self, other)
            }

            pub fn intersection<R>(&self, other: &R) -> OrderedSet<<Self as FiniteSet>::Elem>
            where
                R: FiniteSet<Elem = <Self as FiniteSet>::Elem> + ?Sized,
            {
                intersection(self, other)
            }

            pub fn difference<R>(&self, other: &R) -> OrderedSet<<Self as FiniteSet>::Elem>
            where
                R: FiniteSet<Elem = <Self as FiniteSet>::Elem> + ?Sized,
            {
                difference(self, other)
            }

            pub fn symmetric_difference<R>(
                &self,
                other: &R,
            ) -> OrderedSet<<Self as FiniteSet>::Elem>
            where
                R: FiniteSet<Elem = <Self as FiniteSet>::Elem> + ?Sized,
            {
                symmetric_difference(self, other)
            }

            pub fn is_disjoint<R>(&self, other: &R) -> bool
            where
                R: FiniteSet<Elem = <Self as FiniteSet>::Elem> + ?Sized,
            {
                is_disjoint(self, other)
            }

            pub fn is_subset<R>(&self, other: &R) -> bool
            where
                R: FiniteSet<Elem = <Self as FiniteSet>::Elem> + ?Sized,
            {
                is_subset(self, other)
            }

            pub fn is_superset<R>(&self, other: &R) -> bool
            where
                R: FiniteSet<Elem = <Self as FiniteSet>::Elem> + ?Sized,
            {
                is_subset(other, self)
            }
        }
    };
}

view_algebra!(Keys, [K: Eq + Hash + Clone, S: BuildHasher]);
view_algebra!(Items, [K: Eq + Hash + Clone, V: Eq + Hash + Clone, S: BuildHasher]);

impl<'b, K, V, V2, S, S2> PartialEq<Keys<'b, K, V2, S2>> for Keys<'_, K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
    S2: BuildHasher,
{
    /// Set equality: same keys in any order.
    fn eq(&self, other: &Keys<'b, K, V2, S2>) -> bool {
        self.len() == other.len() && self.iter().all(|k| other.map.contains_key(k))
    }
}

impl<'b, K, V, S, S2> PartialEq<Items<'b, K, V, S2>> for Items<'_, K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
    S2: BuildHasher,
{
    fn eq(&self, other: &Items<'b, K, V, S2>) -> bool {
        self.map == other.map
    }
}
