//! seqmap: insertion-ordered hash containers with live views, layered
//! lookups and counting arithmetic.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one ordered hash map whose contract every other container
//!   inherits, so order, lookup and error behavior are decided in one place.
//! - Layers:
//!   - CoreMap<K, V, S>: structural map. A `hashbrown::HashTable` of slot
//!     keys indexes a `SlotMap` of entries; a doubly linked list through the
//!     slots records order. Hands out generational `Handle`s.
//!   - Views (`keys`, `values`, `items`): borrowed projections over a
//!     CoreMap; key and item views support set algebra through `FiniteSet`.
//!   - OrderedSet<T, S>: CoreMap<T, ()>; the result type of view algebra.
//!   - OrderedMap<K, V, S>: positional pops and moves, order-sensitive
//!     equality.
//!   - LayeredMap<K, V, S>: a stack of shared `Rc<RefCell<CoreMap>>`
//!     layers read front to back, written at the front.
//!   - FrequencyMultiset<K, S>: CoreMap<K, i64> with multiset arithmetic.
//!   - snapshot (feature `serde`): serde impls plus arena snapshots that
//!     keep `Rc` sharing across an encode/decode round trip.
//!
//! Constraints
//! - Keys need `Eq + Hash`; equal keys must hash equally. Collisions are
//!   resolved with `Eq`, never identity.
//! - Keys are immutable post-insert; there is no `key_mut`.
//! - Re-setting a key replaces the value in place and keeps the position.
//! - Iteration order is insertion order adjusted by explicit moves, never
//!   hash order. Growth cannot change it.
//! - Absent keys surface as `None` from plain accessors and as
//!   `MapError::KeyNotFound` from `try_get`, `delete` and the positional
//!   operations. `FrequencyMultiset::get` is the only defaulting read.
//!
//! Hasher and rehashing invariants
//! - Each entry stores a precomputed `u64` hash and the index always uses
//!   the stored hash; `K: Hash` is never invoked after insertion.
//!
//! Sequence stamps
//! - Every entry carries an `i64` stamp that increases along iteration
//!   order. Fresh inserts and moves to the back draw from a counter that
//!   starts at 0 and counts up; moves to the front draw from one that
//!   starts at -1 and counts down. Neither resets, not even on `clear`.
//!
//! Concurrency
//! - No internal locking. CoreMap and the containers built on it are
//!   `Send`/`Sync` when their contents and hasher are; the borrow checker
//!   rejects mutation while an iterator or view is alive.
//! - LayeredMap is `!Send`. Its write paths use `try_borrow_mut` and report
//!   an outstanding borrow of the first layer as
//!   `MapError::ConcurrentModification`.
//!
//! Logging
//! - `tracing` events only: `trace` on index growth and ordered pops,
//!   `debug` when a LayeredMap derives a child or parent stack and when a
//!   snapshot is captured or restored. No subscriber is installed here.

pub mod core_map;
mod core_map_proptest;
pub mod error;
pub mod frequency;
pub mod layered_map;
pub mod ordered_map;
pub mod ordered_set;
#[cfg(feature = "serde")]
pub mod snapshot;
pub mod views;

// Public surface
pub use core_map::{CoreMap, Handle};
pub use error::MapError;
pub use frequency::FrequencyMultiset;
pub use layered_map::{layer, Layer, LayeredMap};
pub use ordered_map::OrderedMap;
pub use ordered_set::OrderedSet;
#[cfg(feature = "serde")]
pub use snapshot::{LayeredSnapshot, SharedSnapshot};
pub use views::{FiniteSet, Items, Keys, Values};
