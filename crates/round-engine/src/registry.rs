//! Miner Registry (§4, "Miner Registry" row in the component table) and the
//! per-round reward-recipient cache (§4.3 step 3, §4.7 step 7).
//!
//! A single `RwLock<HashMap>` satisfies the `sync.Map`-style concurrent
//! registry contract from §9: `get_or_create` is the `LoadOrStore` atomic
//! the design notes call for, implemented by upgrading to a write lock only
//! on the miss path.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::domain::Miner;

/// Concurrent accountId → `Miner` map. Readers never block each other;
/// mutation of the map itself (insert/remove) takes the write lock, while
/// mutation of an individual miner's state goes through `Miner`'s own
/// mutex and never touches this lock.
pub struct MinerRegistry {
    miners: RwLock<HashMap<u64, Arc<Miner>>>,
}

impl MinerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { miners: RwLock::new(HashMap::new()) }
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<Arc<Miner>> {
        self.miners.read().expect("registry lock poisoned").get(&id).cloned()
    }

    /// `LoadOrStore(id, candidate)`: returns the existing miner if present,
    /// otherwise inserts and returns `make()`'s result. `make` only runs on
    /// the miss path.
    pub fn get_or_insert_with(&self, id: u64, make: impl FnOnce() -> Arc<Miner>) -> Arc<Miner> {
        if let Some(existing) = self.get(id) {
            return existing;
        }
        let mut guard = self.miners.write().expect("registry lock poisoned");
        guard.entry(id).or_insert_with(make).clone()
    }

    pub fn insert(&self, miner: Arc<Miner>) {
        self.miners.write().expect("registry lock poisoned").insert(miner.id, miner);
    }

    pub fn remove(&self, id: u64) {
        self.miners.write().expect("registry lock poisoned").remove(&id);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.miners.read().expect("registry lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A snapshot of every registered miner, for the periodic sweeps (new
    /// block commit, name refresh) that must visit all of them.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Miner>> {
        self.miners.read().expect("registry lock poisoned").values().cloned().collect()
    }
}

impl Default for MinerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-round cache of accounts whose reward recipient points at the pool
/// (§4.3 step 3). Refreshed wholesale on every new-block commit (§4.7 step
/// 7); misses during submission handling are filled one at a time from the
/// wallet.
pub struct RewardRecipientCache {
    ids: RwLock<HashSet<u64>>,
}

impl RewardRecipientCache {
    #[must_use]
    pub fn new() -> Self {
        Self { ids: RwLock::new(HashSet::new()) }
    }

    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.ids.read().expect("reward recipient cache lock poisoned").contains(&id)
    }

    pub fn insert(&self, id: u64) {
        self.ids.write().expect("reward recipient cache lock poisoned").insert(id);
    }

    /// Full snapshot refresh (§4.7 step 7).
    pub fn replace_all(&self, fresh: impl IntoIterator<Item = u64>) {
        let mut guard = self.ids.write().expect("reward recipient cache lock poisoned");
        guard.clear();
        guard.extend(fresh);
    }
}

impl Default for RewardRecipientCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_insert_with_only_builds_once() {
        let registry = MinerRegistry::new();
        let calls = std::sync::atomic::AtomicUsize::new(0);
        let make = || {
            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Arc::new(Miner::new(1, "ADDR".to_string(), None, 0))
        };
        let a = registry.get_or_insert_with(1, make);
        let b = registry.get_or_insert_with(1, || Arc::new(Miner::new(1, "OTHER".to_string(), None, 0)));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn remove_evicts_from_registry() {
        let registry = MinerRegistry::new();
        registry.insert(Arc::new(Miner::new(7, "ADDR".to_string(), None, 0)));
        assert_eq!(registry.len(), 1);
        registry.remove(7);
        assert!(registry.is_empty());
    }

    #[test]
    fn reward_recipient_cache_replace_drops_stale_entries() {
        let cache = RewardRecipientCache::new();
        cache.insert(1);
        cache.insert(2);
        cache.replace_all([2, 3]);
        assert!(!cache.contains(1));
        assert!(cache.contains(2));
        assert!(cache.contains(3));
    }
}
