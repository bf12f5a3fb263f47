//! Error type shared by every container in the crate.

/// Failures reported by map, set and multiset operations.
///
/// Absent keys are reported through `Option` by the plain accessors
/// (`get`, `find`, ...) and through `KeyNotFound` by the `try_*`,
/// `delete` and positional operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("key not found")]
    KeyNotFound,
    #[error("container is empty")]
    EmptyContainer,
    /// A `LayeredMap` write found its first layer already borrowed.
    #[error("layer is borrowed elsewhere; concurrent modification refused")]
    ConcurrentModification,
    /// A snapshot entry points past the end of the object arena.
    #[error("snapshot references missing object #{index}")]
    DanglingObject { index: usize },
}
