//! Bridge cache
//!
//! One bridge type per (user type, host type) pair for the lifetime of the
//! owning engine. Lookup and creation happen under a single lock, so
//! concurrent fusions of the same pair never derive two bridges.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::realm::TypeId;

/// Identity of a hierarchy pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BridgeKey {
    /// User type
    pub user: TypeId,
    /// Host type
    pub host: TypeId,
}

impl BridgeKey {
    /// Create a key
    pub fn new(user: TypeId, host: TypeId) -> Self {
        Self { user, host }
    }
}

/// Cached bridge for a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeEntry {
    /// Bridge type node
    pub bridge: TypeId,
    /// Whether the host hierarchy is spliced in
    pub spliced: bool,
}

/// Memo table of bridges, keyed by pair identity
#[derive(Debug, Default)]
pub struct BridgeCache {
    entries: Mutex<FxHashMap<BridgeKey, BridgeEntry>>,
    created: AtomicU64,
}

impl BridgeCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the bridge for a pair
    pub fn get(&self, key: BridgeKey) -> Option<BridgeEntry> {
        self.entries.lock().get(&key).copied()
    }

    /// Return the cached bridge for `key`, or build one with `create`.
    ///
    /// `create` runs with the lock held. A `None` from it leaves the cache
    /// untouched. The boolean is `true` when the entry was just created.
    pub fn get_or_create<F>(&self, key: BridgeKey, create: F) -> Option<(BridgeEntry, bool)>
    where
        F: FnOnce() -> Option<BridgeEntry>,
    {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(&key) {
            return Some((*entry, false));
        }
        let entry = create()?;
        entries.insert(key, entry);
        self.created.fetch_add(1, Ordering::Relaxed);
        Some((entry, true))
    }

    /// Number of cached pairs
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if no bridge has been cached
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Number of bridges ever created
    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32) -> BridgeEntry {
        BridgeEntry {
            bridge: TypeId(id),
            spliced: true,
        }
    }

    #[test]
    fn test_create_once_per_pair() {
        let cache = BridgeCache::new();
        let key = BridgeKey::new(TypeId(1), TypeId(2));

        let (first, created) = cache.get_or_create(key, || Some(entry(10))).unwrap();
        assert!(created);
        let (second, created) = cache
            .get_or_create(key, || panic!("must not rebuild"))
            .unwrap();
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(cache.created_count(), 1);
    }

    #[test]
    fn test_distinct_pairs_get_distinct_entries() {
        let cache = BridgeCache::new();
        cache.get_or_create(BridgeKey::new(TypeId(1), TypeId(2)), || Some(entry(10)));
        cache.get_or_create(BridgeKey::new(TypeId(1), TypeId(3)), || Some(entry(11)));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(BridgeKey::new(TypeId(1), TypeId(3))), Some(entry(11)));
        assert_eq!(cache.get(BridgeKey::new(TypeId(3), TypeId(1))), None);
    }

    #[test]
    fn test_failed_creation_is_not_cached() {
        let cache = BridgeCache::new();
        let key = BridgeKey::new(TypeId(1), TypeId(2));
        assert!(cache.get_or_create(key, || None).is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.created_count(), 0);
    }
}
