//! Small time-bounded cache for store lookups that rarely change.
//!
//! Backed by moka's concurrent cache.

use std::time::Duration;

use moka::sync::Cache;

/// Thread-safe in-memory cache with capacity and time-to-live bounds.
///
/// Used for the primitive catalog (`MemCache<&'static str, Vec<String>>`),
/// which the side panel reads every time it opens.
#[derive(Clone)]
pub struct MemCache<K, V> {
    entries: Cache<K, V>,
}

impl<K, V> MemCache<K, V>
where
    K: std::hash::Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Allocate a new [`MemCache`] whose entries expire after `ttl`.
    pub fn new(
        capacity: usize,
        ttl: Duration,
    ) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity as u64).time_to_live(ttl).build(),
        }
    }

    pub fn set(
        &self,
        key: K,
        value: V,
    ) {
        self.entries.insert(key, value);
    }

    pub fn get(
        &self,
        key: &K,
    ) -> Option<V> {
        self.entries.get(key)
    }

    pub fn remove(
        &self,
        key: &K,
    ) {
        self.entries.invalidate(key);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::MemCache;

    #[test]
    fn test_set_get_remove() {
        let cache = MemCache::new(4, Duration::from_secs(60));
        cache.set("primitives", vec!["validateOrder".to_string()]);
        assert_eq!(cache.get(&"primitives"), Some(vec!["validateOrder".to_string()]));

        cache.remove(&"primitives");
        assert_eq!(cache.get(&"primitives"), None);
    }
}
