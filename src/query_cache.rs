// src/query_cache.rs
//! Bounded-TTL LRU query result cache (spec §4.7).
//!
//! Scoped per-`Collection` (the Open Question on cache scope is resolved
//! this way in SPEC_FULL.md, matching the teacher's `QueryCache` ownership:
//! each `Collection` owns one cache instance, invalidated wholesale on any
//! write to that collection rather than tracked per sub-collection).

use crate::value::DocumentId;
use crate::value::Value;
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// Hash of a query's canonical JSON form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryHash(u64);

impl QueryHash {
    pub fn new(query: &Value) -> Self {
        let mut hasher = DefaultHasher::new();
        query.canonical_json().hash(&mut hasher);
        QueryHash(hasher.finish())
    }
}

struct Entry {
    ids: Vec<DocumentId>,
    inserted_at: Instant,
}

/// Thread-safe LRU cache of query results keyed by canonical query hash,
/// with a uniform time-to-live applied at read time.
pub struct QueryCache {
    cache: Mutex<LruCache<QueryHash, Entry>>,
    capacity: usize,
    ttl: Duration,
}

impl QueryCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = capacity.max(1);
        QueryCache {
            cache: Mutex::new(LruCache::new(NonZeroUsize::new(capacity).unwrap())),
            capacity,
            ttl,
        }
    }

    /// Returns the cached IDs unless absent or expired (an expired entry is
    /// evicted on read, same as the teacher's lazy-expiry approach).
    pub fn get(&self, query_hash: &QueryHash) -> Option<Vec<DocumentId>> {
        let mut cache = self.cache.lock();
        let expired = match cache.peek(query_hash) {
            Some(entry) => entry.inserted_at.elapsed() > self.ttl,
            None => return None,
        };
        if expired {
            cache.pop(query_hash);
            return None;
        }
        cache.get(query_hash).map(|e| e.ids.clone())
    }

    pub fn insert(&self, query_hash: QueryHash, doc_ids: Vec<DocumentId>) {
        let mut cache = self.cache.lock();
        cache.put(query_hash, Entry { ids: doc_ids, inserted_at: Instant::now() });
    }

    /// Drop every cached entry. Called on any insert/update/delete/index
    /// change to the owning collection.
    pub fn invalidate_all(&self) {
        self.cache.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.lock();
        CacheStats { capacity: self.capacity, size: cache.len() }
    }
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub capacity: usize,
    pub size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn q(v: serde_json::Value) -> Value {
        Value::from_json(&v)
    }

    #[test]
    fn hash_is_deterministic_and_discriminates_queries() {
        let q1 = q(json!({"age": {"$gte": 25}}));
        let q2 = q(json!({"age": {"$gte": 30}}));
        assert_eq!(QueryHash::new(&q1), QueryHash::new(&q1));
        assert_ne!(QueryHash::new(&q1), QueryHash::new(&q2));
    }

    #[test]
    fn hash_ignores_key_order() {
        let q1 = q(json!({"a": 1, "b": 2}));
        let q2 = q(json!({"b": 2, "a": 1}));
        assert_eq!(QueryHash::new(&q1), QueryHash::new(&q2));
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let cache = QueryCache::new(100, Duration::from_secs(60));
        let hash = QueryHash::new(&q(json!({"age": 25})));
        let ids = vec![DocumentId::Number(1), DocumentId::Number(2)];
        cache.insert(hash, ids.clone());
        assert_eq!(cache.get(&hash), Some(ids));
    }

    #[test]
    fn lru_eviction_drops_oldest_entry() {
        let cache = QueryCache::new(2, Duration::from_secs(60));
        let h1 = QueryHash::new(&q(json!({"age": 1})));
        let h2 = QueryHash::new(&q(json!({"age": 2})));
        let h3 = QueryHash::new(&q(json!({"age": 3})));
        cache.insert(h1, vec![DocumentId::Number(1)]);
        cache.insert(h2, vec![DocumentId::Number(2)]);
        cache.insert(h3, vec![DocumentId::Number(3)]);
        assert_eq!(cache.get(&h1), None);
        assert_eq!(cache.get(&h2), Some(vec![DocumentId::Number(2)]));
    }

    #[test]
    fn ttl_expiry_evicts_on_read() {
        let cache = QueryCache::new(100, Duration::from_millis(1));
        let hash = QueryHash::new(&q(json!({"age": 25})));
        cache.insert(hash, vec![DocumentId::Number(1)]);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get(&hash), None);
    }

    #[test]
    fn invalidate_all_clears_cache() {
        let cache = QueryCache::new(100, Duration::from_secs(60));
        let hash = QueryHash::new(&q(json!({"age": 25})));
        cache.insert(hash, vec![DocumentId::Number(1)]);
        cache.invalidate_all();
        assert_eq!(cache.get(&hash), None);
        assert_eq!(cache.stats().size, 0);
    }
}
