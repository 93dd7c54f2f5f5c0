//! Utility types.

type BuildHasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

/// Hash map with deterministic (insertion-order) iteration.
///
/// Table emission and conflict diagnostics iterate these maps, so the
/// iteration order must be reproducible run-to-run.
pub type Map<K, V> = indexmap::IndexMap<K, V, BuildHasher>;

/// Hash set with deterministic (insertion-order) iteration.
pub type Set<T> = indexmap::IndexSet<T, BuildHasher>;
