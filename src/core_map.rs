//! CoreMap: insertion-ordered hash map with stable handles.
//!
//! Entries live in a `SlotMap`; a `HashTable` of slot keys indexes them by
//! their stored hash, and a doubly linked list threaded through the slots
//! records iteration order. Growth of the index never touches the list, so
//! resizing cannot reorder entries or change which keys are reachable.

use crate::error::MapError;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::ops::Index;
use hashbrown::hash_table::Entry as TableEntry;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SecondaryMap, SlotMap};
use std::collections::hash_map::RandomState;

/// Generational reference to one entry. Never resolves to a different
/// entry after the original is removed, even if the slot is reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub fn key<'a, K, V, S>(&self, map: &'a CoreMap<K, V, S>) -> Option<&'a K> {
        map.slots.get(self.0).map(|s| &s.key)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a CoreMap<K, V, S>) -> Option<&'a V> {
        map.slots.get(self.0).map(|s| &s.value)
    }

    pub fn value_mut<'a, K, V, S>(&self, map: &'a mut CoreMap<K, V, S>) -> Option<&'a mut V> {
        map.slots.get_mut(self.0).map(|s| &mut s.value)
    }

    /// Position stamp of the entry; increases along iteration order.
    pub fn sequence<K, V, S>(&self, map: &CoreMap<K, V, S>) -> Option<i64> {
        map.slots.get(self.0).map(|s| s.seq)
    }
}

#[derive(Clone, Debug)]
struct Slot<K, V> {
    key: K,
    value: V,
    hash: u64,
    seq: i64,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

/// Hash map that iterates in insertion order.
///
/// Re-setting an existing key replaces the value in place: the entry keeps
/// its position and its sequence stamp. Keys are owned by the map and never
/// handed out mutably.
#[derive(Clone)]
pub struct CoreMap<K, V, S = RandomState> {
    hasher: S,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Slot<K, V>>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
    back_seq: i64,
    front_seq: i64,
}

impl<K, V> CoreMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V, S: Default> Default for CoreMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

// Structural operations: none of these hash or compare keys.
impl<K, V, S> CoreMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::with_capacity(capacity),
            slots: SlotMap::with_capacity_and_key(capacity),
            head: None,
            tail: None,
            back_seq: 0,
            front_seq: -1,
        }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of entries the index holds before it has to grow.
    pub fn capacity(&self) -> usize {
        self.index.capacity()
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.head
            .and_then(|k| self.slots.get(k))
            .map(|s| (&s.key, &s.value))
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        self.tail
            .and_then(|k| self.slots.get(k))
            .map(|s| (&s.key, &s.value))
    }

    /// Remove and return the most recently positioned entry.
    pub fn pop_item(&mut self) -> Result<(K, V), MapError> {
        self.pop_back().ok_or(MapError::EmptyContainer)
    }

    /// Remove every entry. Sequence counters keep running.
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.head = None;
        self.tail = None;
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            front: self.head,
            back: self.tail,
            remaining: self.slots.len(),
        }
    }

    /// Walks the order list once, then hands out disjoint borrows keyed by
    /// slot.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let mut order = Vec::with_capacity(self.slots.len());
        let mut cur = self.head;
        while let Some(k) = cur {
            order.push(k);
            cur = self.slots.get(k).and_then(|s| s.next);
        }
        let mut borrows: SecondaryMap<DefaultKey, (&K, &mut V)> = self
            .slots
            .iter_mut()
            .map(|(k, s)| (k, (&s.key, &mut s.value)))
            .collect();
        debug_assert_eq!(order.len(), borrows.len());
        let items: Vec<(&K, &mut V)> = order.into_iter().filter_map(|k| borrows.remove(k)).collect();
        IterMut {
            inner: items.into_iter(),
        }
    }

    pub(crate) fn pop_front(&mut self) -> Option<(K, V)> {
        let k = self.head?;
        self.remove_slot(k)
    }

    pub(crate) fn pop_back(&mut self) -> Option<(K, V)> {
        let k = self.tail?;
        self.remove_slot(k)
    }

    fn next_back_seq(&mut self) -> i64 {
        let seq = self.back_seq;
        self.back_seq += 1;
        seq
    }

    fn next_front_seq(&mut self) -> i64 {
        let seq = self.front_seq;
        self.front_seq -= 1;
        seq
    }

    fn link_back(&mut self, k: DefaultKey) {
        let old_tail = self.tail;
        if let Some(s) = self.slots.get_mut(k) {
            s.prev = old_tail;
            s.next = None;
        }
        match old_tail {
            Some(t) => self.slots[t].next = Some(k),
            None => self.head = Some(k),
        }
        self.tail = Some(k);
    }

    fn link_front(&mut self, k: DefaultKey) {
        let old_head = self.head;
        if let Some(s) = self.slots.get_mut(k) {
            s.prev = None;
            s.next = old_head;
        }
        match old_head {
            Some(h) => self.slots[h].prev = Some(k),
            None => self.tail = Some(k),
        }
        self.head = Some(k);
    }

    fn unlink(&mut self, k: DefaultKey) {
        let (prev, next) = match self.slots.get(k) {
            Some(s) => (s.prev, s.next),
            None => return,
        };
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }
    }

    fn remove_slot(&mut self, k: DefaultKey) -> Option<(K, V)> {
        self.unlink(k);
        let slot = self.slots.remove(k)?;
        if let Ok(entry) = self.index.find_entry(slot.hash, |&kk| kk == k) {
            let _ = entry.remove();
        }
        Some((slot.key, slot.value))
    }
}

impl<K, V, S> CoreMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn locate<Q>(&self, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.index
            .find(hash, |&k| {
                self.slots
                    .get(k)
                    .map(|s| s.key.borrow() == q)
                    .unwrap_or(false)
            })
            .copied()
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.locate(q).map(Handle)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.locate(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.locate(q)?;
        self.slots.get(k).map(|s| &s.value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.locate(q)?;
        self.slots.get_mut(k).map(|s| &mut s.value)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.locate(q)?;
        self.slots.get(k).map(|s| (&s.key, &s.value))
    }

    /// Like `get`, but an absent key is an error.
    pub fn try_get<Q>(&self, q: &Q) -> Result<&V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).ok_or(MapError::KeyNotFound)
    }

    pub fn sequence_of<Q>(&self, q: &Q) -> Option<i64>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.locate(q)?;
        self.slots.get(k).map(|s| s.seq)
    }

    /// Insert `key -> value` at the back, or replace the value of an equal
    /// key in place. Returns the replaced value. The stored key is kept.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        let before = self.index.capacity();
        let slots = &self.slots;
        match self.index.entry(
            hash,
            |&kk| slots.get(kk).map(|s| s.key == key).unwrap_or(false),
            |&kk| slots.get(kk).map(|s| s.hash).unwrap_or(0),
        ) {
            TableEntry::Occupied(o) => {
                let k = *o.get();
                self.slots
                    .get_mut(k)
                    .map(|s| core::mem::replace(&mut s.value, value))
            }
            TableEntry::Vacant(v) => {
                let seq = self.back_seq;
                let k = self.slots.insert(Slot {
                    key,
                    value,
                    hash,
                    seq,
                    prev: None,
                    next: None,
                });
                let _ = v.insert(k);
                self.back_seq += 1;
                self.link_back(k);
                self.trace_growth(before);
                None
            }
        }
    }

    /// Value for `key`, inserting `default()` at the back first when absent.
    /// `default` only runs on a miss.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let hash = self.make_hash(&key);
        let before = self.index.capacity();
        let slots = &self.slots;
        let k = match self.index.entry(
            hash,
            |&kk| slots.get(kk).map(|s| s.key == key).unwrap_or(false),
            |&kk| slots.get(kk).map(|s| s.hash).unwrap_or(0),
        ) {
            TableEntry::Occupied(o) => *o.get(),
            TableEntry::Vacant(v) => {
                let seq = self.back_seq;
                let k = self.slots.insert(Slot {
                    key,
                    value: default(),
                    hash,
                    seq,
                    prev: None,
                    next: None,
                });
                let _ = v.insert(k);
                self.back_seq += 1;
                self.link_back(k);
                self.trace_growth(before);
                k
            }
        };
        &mut self.slots[k].value
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.locate(q)?;
        self.remove_slot(k)
    }

    /// Remove `key`, failing with `KeyNotFound` when it is absent.
    pub fn delete<Q>(&mut self, q: &Q) -> Result<V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q)
            .map(|(_, v)| v)
            .ok_or(MapError::KeyNotFound)
    }

    pub(crate) fn move_back<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let Some(k) = self.locate(q) else {
            return false;
        };
        if self.tail != Some(k) {
            self.unlink(k);
            self.link_back(k);
        }
        let seq = self.next_back_seq();
        self.slots[k].seq = seq;
        true
    }

    pub(crate) fn move_front<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let Some(k) = self.locate(q) else {
            return false;
        };
        if self.head != Some(k) {
            self.unlink(k);
            self.link_front(k);
        }
        let seq = self.next_front_seq();
        self.slots[k].seq = seq;
        true
    }

    fn trace_growth(&self, before: usize) {
        let after = self.index.capacity();
        if after != before {
            tracing::trace!(from = before, to = after, len = self.len(), "core map index grew");
        }
    }
}

impl<K, V, S1, S2> PartialEq<CoreMap<K, V, S2>> for CoreMap<K, V, S1>
where
    K: Eq + Hash,
    V: PartialEq,
    S1: BuildHasher,
    S2: BuildHasher,
{
    /// Order-insensitive: same keys mapped to equal values.
    fn eq(&self, other: &CoreMap<K, V, S2>) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |ov| v == ov))
    }
}

impl<K, V, S> Eq for CoreMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for CoreMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, Q, V, S> Index<&Q> for CoreMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not present in map")
    }
}

impl<K, V, S> FromIterator<(K, V)> for CoreMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for CoreMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for CoreMap<K, V>
where
    K: Eq + Hash,
{
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}

/// Iterator over entries in order.
pub struct Iter<'a, K, V> {
    slots: &'a SlotMap<DefaultKey, Slot<K, V>>,
    front: Option<DefaultKey>,
    back: Option<DefaultKey>,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let s = self.slots.get(self.front?)?;
        self.front = s.next;
        self.remaining -= 1;
        Some((&s.key, &s.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let s = self.slots.get(self.back?)?;
        self.back = s.prev;
        self.remaining -= 1;
        Some((&s.key, &s.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over entries in order with mutable values.
pub struct IterMut<'a, K, V> {
    inner: std::vec::IntoIter<(&'a K, &'a mut V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// Owning iterator; yields entries in order.
pub struct IntoIter<K, V> {
    slots: SlotMap<DefaultKey, Slot<K, V>>,
    front: Option<DefaultKey>,
    back: Option<DefaultKey>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let s = self.slots.remove(self.front?)?;
        self.front = s.next;
        Some((s.key, s.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.slots.len(), Some(self.slots.len()))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let s = self.slots.remove(self.back?)?;
        self.back = s.prev;
        Some((s.key, s.value))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V, S> IntoIterator for CoreMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            slots: self.slots,
            front: self.head,
            back: self.tail,
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a CoreMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut CoreMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}
