//! Serde support and identity-preserving snapshots.
//!
//! Maps serialize as maps in iteration order and deserialize by inserting in
//! the encoded order, so order survives a round trip. Sets serialize as
//! sequences.
//!
//! Plain serde has no notion of shared ownership: two entries holding the
//! same `Rc` would decode as two independent values. [`SharedSnapshot`] and
//! [`LayeredSnapshot`] keep sharing intact by storing each distinct
//! allocation once in an arena and referring to it by index. The identity
//! table only lives for the duration of one `capture` call.

use crate::core_map::CoreMap;
use crate::error::MapError;
use crate::frequency::FrequencyMultiset;
use crate::layered_map::{layer, Layer, LayeredMap};
use crate::ordered_map::OrderedMap;
use crate::ordered_set::OrderedSet;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

impl<K, V, H> Serialize for CoreMap<K, V, H>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct CoreMapVisitor<K, V, H> {
    marker: PhantomData<fn() -> CoreMap<K, V, H>>,
}

impl<'de, K, V, H> serde::de::Visitor<'de> for CoreMapVisitor<K, V, H>
where
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de>,
    H: BuildHasher + Default,
{
    type Value = CoreMap<K, V, H>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let capacity = access.size_hint().unwrap_or(0);
        let mut map = CoreMap::with_capacity_and_hasher(capacity, H::default());
        // A repeated key keeps its first position and its last value.
        while let Some((key, value)) = access.next_entry()? {
            map.set(key, value);
        }
        Ok(map)
    }
}

impl<'de, K, V, H> Deserialize<'de> for CoreMap<K, V, H>
where
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de>,
    H: BuildHasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(CoreMapVisitor {
            marker: PhantomData,
        })
    }
}

impl<K, V, H> Serialize for OrderedMap<K, V, H>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.as_map().serialize(serializer)
    }
}

impl<'de, K, V, H> Deserialize<'de> for OrderedMap<K, V, H>
where
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de>,
    H: BuildHasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        CoreMap::deserialize(deserializer).map(OrderedMap::from)
    }
}

impl<K, H> Serialize for FrequencyMultiset<K, H>
where
    K: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.as_map().serialize(serializer)
    }
}

impl<'de, K, H> Deserialize<'de> for FrequencyMultiset<K, H>
where
    K: Deserialize<'de> + Eq + Hash,
    H: BuildHasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        CoreMap::deserialize(deserializer).map(FrequencyMultiset::from)
    }
}

impl<T, H> Serialize for OrderedSet<T, H>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for elem in self {
            seq.serialize_element(elem)?;
        }
        seq.end()
    }
}

struct OrderedSetVisitor<T, H> {
    marker: PhantomData<fn() -> OrderedSet<T, H>>,
}

impl<'de, T, H> serde::de::Visitor<'de> for OrderedSetVisitor<T, H>
where
    T: Deserialize<'de> + Eq + Hash,
    H: BuildHasher + Default,
{
    type Value = OrderedSet<T, H>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut set = OrderedSet::with_hasher(H::default());
        while let Some(elem) = access.next_element()? {
            set.insert(elem);
        }
        Ok(set)
    }
}

impl<'de, T, H> Deserialize<'de> for OrderedSet<T, H>
where
    T: Deserialize<'de> + Eq + Hash,
    H: BuildHasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(OrderedSetVisitor {
            marker: PhantomData,
        })
    }
}

/// Encodable form of a `CoreMap<K, Rc<T>>` that keeps `Rc` sharing.
///
/// Every distinct allocation appears once in `objects`; `entries` keeps the
/// map order and points into `objects` by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedSnapshot<K, T> {
    pub objects: Vec<T>,
    pub entries: Vec<(K, usize)>,
}

impl<K, T> SharedSnapshot<K, T>
where
    K: Clone,
    T: Clone,
{
    pub fn capture<H>(map: &CoreMap<K, Rc<T>, H>) -> Self {
        let mut ids: hashbrown::HashMap<*const T, usize> = hashbrown::HashMap::new();
        let mut objects = Vec::new();
        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            let index = *ids.entry(Rc::as_ptr(value)).or_insert_with(|| {
                objects.push(T::clone(value));
                objects.len() - 1
            });
            entries.push((key.clone(), index));
        }
        tracing::debug!(
            entries = entries.len(),
            objects = objects.len(),
            "captured shared snapshot"
        );
        Self { objects, entries }
    }
}

impl<K, T> SharedSnapshot<K, T> {
    /// Rebuild the map with one fresh `Rc` per arena object, so entries that
    /// shared a value before capture share one again.
    pub fn restore<H>(self) -> Result<CoreMap<K, Rc<T>, H>, MapError>
    where
        K: Eq + Hash,
        H: BuildHasher + Default,
    {
        let objects: Vec<Rc<T>> = self.objects.into_iter().map(Rc::new).collect();
        let mut map = CoreMap::with_capacity_and_hasher(self.entries.len(), H::default());
        for (key, index) in self.entries {
            let object = objects
                .get(index)
                .ok_or(MapError::DanglingObject { index })?;
            map.set(key, Rc::clone(object));
        }
        tracing::debug!(
            entries = map.len(),
            objects = objects.len(),
            "restored shared snapshot"
        );
        Ok(map)
    }
}

/// Encodable form of a `LayeredMap`. A layer referenced more than once in
/// the stack is stored once and decodes to a single shared layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayeredSnapshot<K, V> {
    pub layers: Vec<Vec<(K, V)>>,
    pub stack: Vec<usize>,
}

impl<K, V> LayeredSnapshot<K, V>
where
    K: Clone,
    V: Clone,
{
    pub fn capture<H>(chain: &LayeredMap<K, V, H>) -> Self {
        let mut ids: hashbrown::HashMap<*const (), usize> = hashbrown::HashMap::new();
        let mut layers = Vec::new();
        let mut stack = Vec::with_capacity(chain.maps().len());
        for shared in chain.maps() {
            let index = *ids
                .entry(Rc::as_ptr(shared).cast::<()>())
                .or_insert_with(|| {
                    let entries = shared
                        .borrow()
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    layers.push(entries);
                    layers.len() - 1
                });
            stack.push(index);
        }
        tracing::debug!(
            depth = stack.len(),
            layers = layers.len(),
            "captured layered snapshot"
        );
        Self { layers, stack }
    }
}

impl<K, V> LayeredSnapshot<K, V> {
    /// Rebuild the stack. An empty stack restores as one empty layer.
    pub fn restore<H>(self) -> Result<LayeredMap<K, V, H>, MapError>
    where
        K: Eq + Hash,
        H: BuildHasher + Default,
    {
        let layers: Vec<Layer<K, V, H>> = self
            .layers
            .into_iter()
            .map(|entries| layer(entries.into_iter().collect()))
            .collect();
        let maps = self
            .stack
            .iter()
            .map(|&index| {
                layers
                    .get(index)
                    .map(Rc::clone)
                    .ok_or(MapError::DanglingObject { index })
            })
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(
            depth = maps.len(),
            layers = layers.len(),
            "restored layered snapshot"
        );
        Ok(LayeredMap::from_layers(maps))
    }
}

impl<K, V, H> Serialize for LayeredMap<K, V, H>
where
    K: Serialize + Clone,
    V: Serialize + Clone,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        LayeredSnapshot::capture(self).serialize(serializer)
    }
}

impl<'de, K, V, H> Deserialize<'de> for LayeredMap<K, V, H>
where
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de>,
    H: BuildHasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        LayeredSnapshot::<K, V>::deserialize(deserializer)?
            .restore()
            .map_err(serde::de::Error::custom)
    }
}
