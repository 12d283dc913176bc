//! Sorted-key checkpoint cache with "equal-or-predecessor" lookup.
//!
//! `FPCache` backs the Traverser's ability to rewind or jump without
//! replaying from the snapshot: it maps a millisecond timestamp to a
//! deep-copied `(state, file offset)` pair.

use std::collections::BTreeMap;

/// A sorted integer-keyed cache with equal-or-predecessor lookup.
///
/// All operations are `O(log n)` in the number of cached keys via the
/// underlying `BTreeMap`.
#[derive(Debug, Clone)]
pub struct FPCache<V> {
    entries: BTreeMap<i64, V>,
}

impl<V> FPCache<V> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        FPCache {
            entries: BTreeMap::new(),
        }
    }

    /// The greatest key currently cached, if any.
    pub fn last_key(&self) -> Option<i64> {
        self.entries.keys().next_back().copied()
    }

    /// Inserts `value` under `key` if `key` is not already present.
    ///
    /// The stored value is a deep copy of `value` (via `Clone`); later
    /// mutation of the caller's own copy never affects what is cached.
    pub fn add(&mut self, key: i64, value: V)
    where
        V: Clone,
    {
        self.entries.entry(key).or_insert_with(|| value.clone());
    }

    /// Returns the value at `key` if present, otherwise the value at the
    /// greatest key strictly less than `key`, otherwise `None`.
    pub fn get(&self, key: i64) -> Option<&V> {
        self.entries.range(..=key).next_back().map(|(_, v)| v)
    }
}

impl<V> Default for FPCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
