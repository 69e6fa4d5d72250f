// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrent key/value map
//!
//! A map that any number of tasks can read, write and delete through a shared
//! handle without extra locking. Tuned for entries written once and read many
//! times, and for workers touching disjoint sets of keys.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

/// Map shared between concurrent tasks
///
/// Cloning the map clones the handle: every clone sees the same entries.
pub struct ConcurrentMap<K, V> {
    entries: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> ConcurrentMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Set the value for a key
    pub fn store(&self, key: K, value: V) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, value);
    }

    /// Get the value stored for a key, if any
    pub fn load(&self, key: &K) -> Option<V> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    /// Return the existing value for the key if present, otherwise store `value`
    ///
    /// The flag is `true` when the value was loaded and `false` when it was
    /// stored. Exactly one of several racing callers for an absent key stores.
    pub fn load_or_store(&self, key: K, value: V) -> (V, bool) {
        if let Some(existing) = self.load(&key) {
            return (existing, true);
        }

        // Re-check under the write lock; another caller may have won the race
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = entries.get(&key) {
            return (existing.clone(), true);
        }
        entries.insert(key, value.clone());
        (value, false)
    }

    /// Remove the value for a key, returning it if it was present
    pub fn load_and_delete(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key)
    }

    /// Remove the value for a key
    pub fn delete(&self, key: &K) {
        self.load_and_delete(key);
    }

    /// Store a value, returning the one it replaced
    pub fn swap(&self, key: K, value: V) -> Option<V> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, value)
    }

    /// Remove every entry
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    /// Call `visit` for each key and value present in the map
    ///
    /// Iteration stops when `visit` returns `false`. This is not a consistent
    /// snapshot: no key is visited twice, but a key stored or deleted while
    /// ranging (including by `visit` itself) may or may not be seen. No lock is
    /// held while `visit` runs, so it may call any method on this map.
    pub fn range<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let keys: Vec<K> = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();

        for key in keys {
            // Deleted since the key list was taken
            let Some(value) = self.load(&key) else {
                continue;
            };
            if !visit(&key, &value) {
                break;
            }
        }
    }

    /// Number of entries, counted by enumerating the map
    ///
    /// Concurrent writers may make the count stale by the time it returns.
    pub fn size(&self) -> usize {
        let mut size = 0;
        self.range(|_, _| {
            size += 1;
            true
        });
        size
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }
}

impl<K, V> ConcurrentMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    /// Replace the value for a key only if it currently equals `old`
    pub fn compare_and_swap(&self, key: &K, old: &V, new: V) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match entries.get_mut(key) {
            Some(current) if *current == *old => {
                *current = new;
                true
            }
            _ => false,
        }
    }

    /// Remove the entry for a key only if its value equals `old`
    pub fn compare_and_delete(&self, key: &K, old: &V) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.get(key).is_some_and(|current| *current == *old) {
            entries.remove(key);
            true
        } else {
            false
        }
    }
}

impl<K, V> Default for ConcurrentMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for ConcurrentMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K, V> std::fmt::Debug for ConcurrentMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self
            .entries
            .read()
            .map(|entries| entries.len())
            .unwrap_or_else(|e| e.into_inner().len());
        f.debug_struct("ConcurrentMap").field("len", &len).finish()
    }
}

#[cfg(test)]
#[path = "map_tests.rs"]
mod tests;
