use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Thread-safe LRU cache of knowledge-base id -> label
///
/// Relation labels repeat across almost every expansion, so each one is
/// looked up once per run instead of once per node.
pub struct LabelCache {
    cache: Mutex<LruCache<String, String>>,
}

impl LabelCache {
    /// Create a new label cache; a capacity of 0 is treated as 1
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Get a cached label
    pub fn get(&self, id: &str) -> Option<String> {
        self.cache.lock().ok()?.get(id).cloned()
    }

    /// Store a label
    pub fn put(&self, id: String, label: String) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(id, label);
        }
    }
}
