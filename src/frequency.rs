//! FrequencyMultiset: a `CoreMap<K, i64>` of counts with multiset
//! arithmetic.
//!
//! Counts are plain signed integers. `set`, `increment` and the subtract
//! family may leave zero or negative counts in place; only the arithmetic
//! operators and `positive` drop non-positive results. Lookups of absent keys
//! read as 0 and never insert.
//!
//! Every count computation saturates at `i64::MIN`/`i64::MAX` instead of
//! overflowing.

use crate::core_map::{self, CoreMap};
use crate::error::MapError;
use crate::views::{Items, Keys, Values};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::ops::{Add, BitAnd, BitOr, Neg, Sub};
use std::collections::hash_map::RandomState;

#[derive(Clone)]
pub struct FrequencyMultiset<K, S = RandomState> {
    counts: CoreMap<K, i64, S>,
}

impl<K> FrequencyMultiset<K>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            counts: CoreMap::new(),
        }
    }
}

impl<K, S: Default> Default for FrequencyMultiset<K, S> {
    fn default() -> Self {
        Self {
            counts: CoreMap::default(),
        }
    }
}

impl<K, S> FrequencyMultiset<K, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            counts: CoreMap::with_hasher(hasher),
        }
    }

    pub fn as_map(&self) -> &CoreMap<K, i64, S> {
        &self.counts
    }

    pub fn into_inner(self) -> CoreMap<K, i64, S> {
        self.counts
    }

    /// Number of distinct keys, whatever their counts.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn iter(&self) -> core_map::Iter<'_, K, i64> {
        self.counts.iter()
    }

    pub fn keys(&self) -> Keys<'_, K, i64, S> {
        self.counts.keys()
    }

    pub fn values(&self) -> Values<'_, K, i64, S> {
        self.counts.values()
    }

    pub fn items(&self) -> Items<'_, K, i64, S> {
        self.counts.items()
    }

    pub fn total(&self) -> i64 {
        self.counts.iter().map(|(_, c)| *c).sum()
    }

    /// Entries by descending count. Ties keep insertion order. `None`
    /// returns every entry.
    pub fn most_common(&self, n: Option<usize>) -> Vec<(&K, i64)> {
        let mut ranked: Vec<(&K, i64)> = self.counts.iter().map(|(k, c)| (k, *c)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        if let Some(n) = n {
            ranked.truncate(n);
        }
        ranked
    }

    /// Each key repeated `count` times, in insertion order. Keys with a
    /// count below one are skipped.
    pub fn elements(&self) -> Elements<'_, K> {
        Elements {
            entries: self.counts.iter(),
            current: None,
            left: 0,
        }
    }
}

impl<K, S> FrequencyMultiset<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Count for `q`; 0 when absent.
    pub fn get<Q>(&self, q: &Q) -> i64
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.counts.get(q).copied().unwrap_or(0)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.counts.contains_key(q)
    }

    pub fn set(&mut self, key: K, count: i64) -> Option<i64> {
        self.counts.set(key, count)
    }

    /// Add `n` (possibly negative) to the count of `key`, saturating.
    pub fn increment(&mut self, key: K, n: i64) {
        let c = self.counts.get_or_insert_with(key, || 0);
        *c = c.saturating_add(n);
    }

    pub fn delete<Q>(&mut self, q: &Q) -> Result<i64, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.counts.delete(q)
    }

    /// Build from explicit counts; a repeated key keeps its first position
    /// and its last count.
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (K, i64)>,
        S: Default,
    {
        let mut out = Self::with_hasher(S::default());
        out.counts.extend(counts);
        out
    }

    /// Add every count of `other`. Nothing is pruned.
    pub fn update<S2>(&mut self, other: &FrequencyMultiset<K, S2>)
    where
        K: Clone,
    {
        for (k, c) in other.iter() {
            self.increment(k.clone(), *c);
        }
    }

    /// Count one more of each yielded key.
    pub fn update_iter<I: IntoIterator<Item = K>>(&mut self, keys: I) {
        for k in keys {
            self.increment(k, 1);
        }
    }

    /// Subtract every count of `other`; results may go negative.
    pub fn subtract<S2>(&mut self, other: &FrequencyMultiset<K, S2>)
    where
        K: Clone,
    {
        for (k, c) in other.iter() {
            let n = self.counts.get_or_insert_with(k.clone(), || 0);
            *n = n.saturating_sub(*c);
        }
    }

    pub fn subtract_iter<I: IntoIterator<Item = K>>(&mut self, keys: I) {
        for k in keys {
            self.increment(k, -1);
        }
    }

    /// Unary plus: only the strictly positive counts.
    pub fn positive(&self) -> Self
    where
        K: Clone,
        S: Default,
    {
        self.filtered(|c| c)
    }

    fn filtered<F>(&self, f: F) -> Self
    where
        F: Fn(i64) -> i64,
        K: Clone,
        S: Default,
    {
        let mut out = Self::with_hasher(S::default());
        for (k, c) in self.iter() {
            let c = f(*c);
            if c > 0 {
                out.counts.set(k.clone(), c);
            }
        }
        out
    }

    // Left entries combined with the right count, then right-only entries.
    fn combine<F, G>(&self, other: &Self, both: F, right_only: G) -> Self
    where
        F: Fn(i64, i64) -> i64,
        G: Fn(i64) -> i64,
        K: Clone,
        S: Default,
    {
        let mut out = Self::with_hasher(S::default());
        for (k, c) in self.iter() {
            let c = both(*c, other.get(k));
            if c > 0 {
                out.counts.set(k.clone(), c);
            }
        }
        for (k, c) in other.iter() {
            if self.contains_key(k) {
                continue;
            }
            let c = right_only(*c);
            if c > 0 {
                out.counts.set(k.clone(), c);
            }
        }
        out
    }
}

impl<K, S> FromIterator<K> for FrequencyMultiset<K, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    /// Counts occurrences.
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut out = Self::with_hasher(S::default());
        out.update_iter(iter);
        out
    }
}

impl<K, S> Extend<K> for FrequencyMultiset<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        self.update_iter(iter);
    }
}

impl<K, const N: usize> From<[(K, i64); N]> for FrequencyMultiset<K>
where
    K: Eq + Hash,
{
    fn from(arr: [(K, i64); N]) -> Self {
        Self::from_counts(arr)
    }
}

impl<K, S> From<CoreMap<K, i64, S>> for FrequencyMultiset<K, S> {
    fn from(counts: CoreMap<K, i64, S>) -> Self {
        Self { counts }
    }
}

impl<K, S1, S2> PartialEq<FrequencyMultiset<K, S2>> for FrequencyMultiset<K, S1>
where
    K: Eq + Hash,
    S1: BuildHasher,
    S2: BuildHasher,
{
    /// Missing keys count as zero.
    fn eq(&self, other: &FrequencyMultiset<K, S2>) -> bool {
        self.iter().all(|(k, c)| *c == other.get(k)) && other.iter().all(|(k, c)| *c == self.get(k))
    }
}

impl<K: Eq + Hash, S: BuildHasher> Eq for FrequencyMultiset<K, S> {}

impl<K: fmt::Debug, S> fmt::Debug for FrequencyMultiset<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FrequencyMultiset")?;
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, S> IntoIterator for &'a FrequencyMultiset<K, S> {
    type Item = (&'a K, &'a i64);
    type IntoIter = core_map::Iter<'a, K, i64>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, S> IntoIterator for FrequencyMultiset<K, S> {
    type Item = (K, i64);
    type IntoIter = core_map::IntoIter<K, i64>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.into_iter()
    }
}

macro_rules! arithmetic {
    ($Trait:ident, $method:ident, $both:expr, $right_only:expr) => {
        impl<K, S> $Trait<&FrequencyMultiset<K, S>> for &FrequencyMultiset<K, S>
        where
            K: Eq + Hash + Clone,
            S: BuildHasher + Default,
        {
            type Output = FrequencyMultiset<K, S>;

            fn $method(self, rhs: &FrequencyMultiset<K, S>) -> FrequencyMultiset<K, S> {
                self.combine(rhs, $both, $right_only)
            }
        }

        impl<K, S> $Trait for FrequencyMultiset<K, S>
        where
            K: Eq + Hash + Clone,
            S: BuildHasher + Default,
        {
            type Output = FrequencyMultiset<K, S>;

            fn $method(self, rhs: FrequencyMultiset<K, S>) -> FrequencyMultiset<K, S> {
                (&self).$method(&rhs)
            }
        }
    };
}

arithmetic!(Add, add, |a: i64, b: i64| a.saturating_add(b), |b| b);
arithmetic!(Sub, sub, |a: i64, b: i64| a.saturating_sub(b), |b: i64| b.saturating_neg());
arithmetic!(BitOr, bitor, |a: i64, b: i64| a.max(b), |b| b);
// A right-only key can never survive a minimum with the left's implicit 0.
arithmetic!(BitAnd, bitand, |a: i64, b: i64| a.min(b), |_| 0);

impl<K, S> Neg for &FrequencyMultiset<K, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher + Default,
{
    type Output = FrequencyMultiset<K, S>;

    /// Negated counts; only keys that were negative survive.
    fn neg(self) -> FrequencyMultiset<K, S> {
        self.filtered(|c: i64| c.saturating_neg())
    }
}

impl<K, S> Neg for FrequencyMultiset<K, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher + Default,
{
    type Output = FrequencyMultiset<K, S>;

    fn neg(self) -> FrequencyMultiset<K, S> {
        -&self
    }
}

/// Lazy expansion of a multiset into repeated keys.
pub struct Elements<'a, K> {
    entries: core_map::Iter<'a, K, i64>,
    current: Option<&'a K>,
    left: i64,
}

impl<'a, K> Iterator for Elements<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        while self.left <= 0 {
            let (k, c) = self.entries.next()?;
            self.current = Some(k);
            self.left = *c;
        }
        self.left -= 1;
        self.current
    }
}

impl<K> FusedIterator for Elements<'_, K> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms<const N: usize>(pairs: [(&'static str, i64); N]) -> FrequencyMultiset<&'static str> {
        FrequencyMultiset::from(pairs)
    }

    /// Invariant: absent keys read as 0 and are not inserted by the read.
    #[test]
    fn missing_reads_zero_without_inserting() {
        let c: FrequencyMultiset<&str> = "hello".split("").filter(|s| !s.is_empty()).collect();
        assert_eq!(c.get("l"), 2);
        assert_eq!(c.get("z"), 0);
        assert!(!c.contains_key("z"));
        assert_eq!(c.len(), 4);
        assert_eq!(c.total(), 5);
    }

    /// Invariant: ties in `most_common` keep insertion order.
    #[test]
    fn most_common_is_stable() {
        let c = ms([("x", 1), ("a", 3), ("y", 1), ("b", 3)]);
        assert_eq!(
            c.most_common(None),
            vec![(&"a", 3), (&"b", 3), (&"x", 1), (&"y", 1)]
        );
        assert_eq!(c.most_common(Some(1)), vec![(&"a", 3)]);
        assert!(c.most_common(Some(0)).is_empty());
    }

    /// Invariant: `elements` repeats by count, skips non-positive counts and
    /// can be restarted.
    #[test]
    fn elements_expand_counts() {
        let mut c = ms([("a", 2), ("b", 1)]);
        assert_eq!(c.elements().copied().collect::<Vec<_>>(), ["a", "a", "b"]);
        assert_eq!(c.elements().copied().collect::<Vec<_>>(), ["a", "a", "b"]);
        c.set("neg", -3);
        c.set("zero", 0);
        c.set("c", 1);
        assert_eq!(c.elements().count(), 4);
    }

    /// Invariant: subtract keeps negative and zero counts in place.
    #[test]
    fn subtract_keeps_non_positive() {
        let mut c = ms([("a", 4), ("b", 2), ("c", 0), ("d", -2)]);
        c.subtract(&ms([("a", 1), ("b", 2), ("c", 3), ("d", 4)]));
        assert_eq!(c, ms([("a", 3), ("b", 0), ("c", -3), ("d", -6)]));
        assert_eq!(c.len(), 4);
        c.subtract_iter(["a", "e"]);
        assert_eq!(c.get("a"), 2);
        assert_eq!(c.get("e"), -1);

        c.update(&ms([("e", 1)]));
        c.update_iter(["f"]);
        assert_eq!(c.get("e"), 0);
        assert_eq!(c.get("f"), 1);
    }

    /// Invariant: binary operators drop non-positive results and order left
    /// entries before right-only ones.
    #[test]
    fn arithmetic_operators() {
        let c = ms([("a", 3), ("b", 1)]);
        let d = ms([("a", 1), ("b", 2)]);
        assert_eq!(&c + &d, ms([("a", 4), ("b", 3)]));
        assert_eq!(&c - &d, ms([("a", 2)]));
        assert_eq!(&c & &d, ms([("a", 1), ("b", 1)]));
        assert_eq!(&c | &d, ms([("a", 3), ("b", 2)]));

        assert_eq!(ms([("a", 5), ("b", 1)]) & ms([("a", 1), ("b", 10)]), ms([("a", 1), ("b", 1)]));

        let sum = &ms([("x", 1)]) + &ms([("y", 2), ("x", 1)]);
        assert_eq!(sum.keys().iter().copied().collect::<Vec<_>>(), ["x", "y"]);

        // A negative right-only count turns positive when subtracted.
        assert_eq!(&ms([]) - &ms([("q", -2)]), ms([("q", 2)]));
        assert_eq!(&ms([]) & &ms([("q", 2)]), ms([]));
    }

    /// Invariant: unary plus keeps positives, unary minus flips negatives.
    #[test]
    fn unary_operators() {
        let c = ms([("a", 10), ("b", -10), ("c", 0)]);
        assert_eq!(c.positive(), ms([("a", 10)]));
        assert_eq!(-&c, ms([("b", 10)]));
        assert_eq!(-c, ms([("b", 10)]));
    }

    /// Invariant: equality treats missing keys as zero.
    #[test]
    fn equality_ignores_zero_counts() {
        assert_eq!(ms([("a", 1), ("b", 0)]), ms([("a", 1)]));
        assert_ne!(ms([("a", 1), ("b", -1)]), ms([("a", 1)]));
        assert_eq!(ms([("a", 1), ("b", 2)]), ms([("b", 2), ("a", 1)]));
    }

    /// Invariant: counts saturate at the i64 bounds.
    #[test]
    fn arithmetic_saturates_at_bounds() {
        let top = ms([("a", i64::MAX)]);
        let bottom = ms([("a", i64::MIN)]);
        assert_eq!(&top + &ms([("a", 1)]), top);
        assert_eq!(&top - &bottom, top);
        assert_eq!(&ms([]) - &bottom, top);
        assert_eq!(-&bottom, top);
        assert_eq!(-&top, ms([]));
        assert_eq!(&bottom | &ms([("a", 2)]), ms([("a", 2)]));

        let mut c = top.clone();
        c.increment("a", 1);
        assert_eq!(c.get("a"), i64::MAX);
        c.subtract(&bottom);
        assert_eq!(c.get("a"), i64::MAX);
        c.update(&top);
        assert_eq!(c.get("a"), i64::MAX);

        let mut d = bottom.clone();
        d.subtract_iter(["a"]);
        d.subtract(&top);
        assert_eq!(d.get("a"), i64::MIN);
    }

    #[test]
    fn explicit_construction_and_delete() {
        let mut c: FrequencyMultiset<&str> = FrequencyMultiset::from_counts([("a", 1), ("b", 2), ("a", 5)]);
        assert_eq!(c.get("a"), 5);
        assert_eq!(c.keys().iter().copied().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(c.delete("a"), Ok(5));
        assert_eq!(c.delete("a"), Err(MapError::KeyNotFound));
        c.extend(["b", "b"]);
        assert_eq!(c.get("b"), 4);
        c.increment("b", -4);
        assert_eq!(c.get("b"), 0);
        assert!(c.contains_key("b"));
    }
}
