//! Bounded least-recently-used map.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::num::NonZeroUsize;

struct Slot<V> {
    value: V,
    tick: u64,
}

/// A fixed-capacity map that evicts the least recently used key on insert.
///
/// Recency is tracked with a monotonically increasing tick: every `get` hit
/// and every `put` stamps the key with a fresh tick, and `order` maps ticks
/// back to keys so the oldest entry is always the first one in the tree.
pub struct LruCache<K, V> {
    entries: HashMap<K, Slot<V>>,
    order: BTreeMap<u64, K>,
    capacity: NonZeroUsize,
    next_tick: u64,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create an empty cache holding at most `capacity` entries.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity.get()),
            order: BTreeMap::new(),
            capacity,
            next_tick: 0,
        }
    }

    /// Look up `key`, marking it most recently used on a hit.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let tick = self.bump();
        let slot = self.entries.get_mut(key)?;
        let key = self
            .order
            .remove(&slot.tick)
            .unwrap_or_else(|| key.clone());
        slot.tick = tick;
        self.order.insert(tick, key);
        Some(&slot.value)
    }

    /// Insert or replace `key`. Returns the entry evicted to make room, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        let tick = self.bump();

        if let Some(slot) = self.entries.get_mut(&key) {
            self.order.remove(&slot.tick);
            slot.tick = tick;
            slot.value = value;
            self.order.insert(tick, key);
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity.get() {
            self.evict_oldest()
        } else {
            None
        };

        self.order.insert(tick, key.clone());
        self.entries.insert(key, Slot { value, tick });
        evicted
    }

    /// Whether `key` is present. Does not touch recency.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    fn evict_oldest(&mut self) -> Option<(K, V)> {
        let (_, key) = self.order.pop_first()?;
        let slot = self.entries.remove(&key)?;
        Some((key, slot.value))
    }

    fn bump(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> LruCache<i64, i64> {
        LruCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_get_and_put() {
        let mut lru = cache(2);
        assert!(lru.is_empty());
        assert_eq!(lru.put(1, 10), None);
        assert_eq!(lru.get(&1), Some(&10));
        assert_eq!(lru.get(&2), None);
        assert_eq!(lru.len(), 1);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut lru = cache(2);
        lru.put(1, 1);
        lru.put(2, 4);
        // Touch 1 so 2 becomes the eviction candidate.
        assert_eq!(lru.get(&1), Some(&1));

        assert_eq!(lru.put(3, 9), Some((2, 4)));
        assert!(lru.contains(&1));
        assert!(!lru.contains(&2));
        assert!(lru.contains(&3));
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_replace_does_not_evict() {
        let mut lru = cache(2);
        lru.put(1, 1);
        lru.put(2, 4);
        assert_eq!(lru.put(1, 100), None);
        assert_eq!(lru.len(), 2);
        assert_eq!(lru.get(&1), Some(&100));

        // 2 is now the oldest.
        assert_eq!(lru.put(3, 9), Some((2, 4)));
    }

    #[test]
    fn test_257_distinct_keys_evict_exactly_the_oldest() {
        let mut lru = cache(256);
        for x in 0..256 {
            assert_eq!(lru.put(x, x * x), None);
        }
        assert_eq!(lru.len(), 256);

        assert_eq!(lru.put(256, 256 * 256), Some((0, 0)));
        assert_eq!(lru.len(), 256);
        assert!(!lru.contains(&0));
        assert!((1..=256).all(|x| lru.contains(&x)));
    }

    #[test]
    fn test_capacity_one() {
        let mut lru = cache(1);
        lru.put(1, 1);
        assert_eq!(lru.put(2, 4), Some((1, 1)));
        assert_eq!(lru.capacity(), 1);
        assert_eq!(lru.get(&2), Some(&4));
    }
}
