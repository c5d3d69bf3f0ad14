use crate::model::Match;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// 增量扫描结果缓存：固定容量，严格 LRU 淘汰
///
/// 句柄可克隆，内部共享同一份存储；锁只在查找/插入期间持有，
/// 不跨越任何 I/O。命中会将条目提升为最近使用。
#[derive(Clone)]
pub struct ResultCache {
    inner: Arc<Mutex<LruCache<String, Vec<Match>>>>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<Match>> {
        self.inner.lock().unwrap().get(key).cloned()
    }

    pub fn put(&self, key: String, value: Vec<Match>) {
        self.inner.lock().unwrap().put(key, value);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used_past_capacity() {
        let cache = ResultCache::new(2);
        cache.put("a".to_string(), vec![]);
        cache.put("b".to_string(), vec![]);
        cache.put("c".to_string(), vec![]);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn get_protects_entry_from_next_eviction() {
        let cache = ResultCache::new(2);
        cache.put("a".to_string(), vec![]);
        cache.put("b".to_string(), vec![]);

        // "a" becomes most-recently-used, so "b" is evicted next
        assert!(cache.get("a").is_some());
        cache.put("c".to_string(), vec![]);

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn put_replaces_existing_key_without_eviction() {
        let cache = ResultCache::new(2);
        cache.put("a".to_string(), vec![]);
        cache.put("b".to_string(), vec![]);
        cache.put("a".to_string(), vec![]);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = ResultCache::new(4);
        cache.put("a".to_string(), vec![]);
        cache.clear();
        assert!(cache.is_empty());
    }
}
