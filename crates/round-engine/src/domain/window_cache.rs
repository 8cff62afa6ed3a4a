//! Block Window Cache (§4.1): bounded windows of recently observed slow and
//! fast block heights.
//!
//! A single write-exclusion lock per window; readers never block each
//! other. Heights are kept ordered so eviction (lowest height) and
//! membership tests are cheap.

use std::collections::BTreeSet;
use std::sync::RwLock;

struct HeightWindow {
    max_len: usize,
    heights: RwLock<BTreeSet<u64>>,
}

impl HeightWindow {
    fn new(max_len: usize) -> Self {
        assert!(max_len > 0, "window capacity must be positive");
        Self {
            max_len,
            heights: RwLock::new(BTreeSet::new()),
        }
    }

    /// Returns the evicted height, or 0 if nothing was evicted (including
    /// the duplicate-height no-op case).
    fn add(&self, height: u64) -> u64 {
        let mut set = self.heights.write().expect("window lock poisoned");
        if !set.insert(height) {
            return 0;
        }
        if set.len() > self.max_len {
            let lowest = *set.iter().next().expect("non-empty after insert");
            set.remove(&lowest);
            return lowest;
        }
        0
    }

    fn contains(&self, height: u64) -> bool {
        self.heights.read().expect("window lock poisoned").contains(&height)
    }
}

/// Classifies and tracks the last `NAVG` slow and `NAVG` fast block heights.
pub struct BlockWindowCache {
    t_min: i64,
    slow: HeightWindow,
    fast: HeightWindow,
}

impl BlockWindowCache {
    /// `navg` bounds each window's size; `t_min` is the slow/fast threshold
    /// in seconds.
    #[must_use]
    pub fn new(navg: usize, t_min: i64) -> Self {
        Self {
            t_min,
            slow: HeightWindow::new(navg),
            fast: HeightWindow::new(navg),
        }
    }

    /// Classifies `height` by `generation_time` then inserts it into the
    /// matching window. Returns the evicted height, or 0.
    pub fn add(&self, height: u64, generation_time: i64) -> u64 {
        if generation_time < self.t_min {
            self.fast.add(height)
        } else {
            self.slow.add(height)
        }
    }

    /// `(slow, known)` — unknown heights return `(_, false)`.
    #[must_use]
    pub fn was_slow_block(&self, height: u64) -> (bool, bool) {
        if self.slow.contains(height) {
            return (true, true);
        }
        if self.fast.contains(height) {
            return (false, true);
        }
        (false, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_height_is_unclassified() {
        let cache = BlockWindowCache::new(4, 240);
        let (slow, known) = cache.was_slow_block(100);
        assert!(!known);
        assert!(!slow);
    }

    #[test]
    fn classifies_by_generation_time_threshold() {
        let cache = BlockWindowCache::new(4, 240);
        cache.add(1, 300);
        cache.add(2, 100);
        assert_eq!(cache.was_slow_block(1), (true, true));
        assert_eq!(cache.was_slow_block(2), (false, true));
    }

    #[test]
    fn duplicate_height_is_idempotent() {
        let cache = BlockWindowCache::new(4, 240);
        assert_eq!(cache.add(10, 300), 0);
        assert_eq!(cache.add(10, 300), 0);
    }

    #[test]
    fn evicts_lowest_height_once_full() {
        let cache = BlockWindowCache::new(2, 300);
        assert_eq!(cache.add(5, 300), 0);
        assert_eq!(cache.add(7, 300), 0);
        assert_eq!(cache.add(9, 300), 5);
        assert_eq!(cache.was_slow_block(5), (false, false));
        assert_eq!(cache.was_slow_block(7).1, true);
        assert_eq!(cache.was_slow_block(9).1, true);
    }

}
