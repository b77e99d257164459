//! Per-type memoization.
//!
//! Attribute schemas and compiled routes are derived once per Rust type and
//! shared afterwards. Entries are keyed by the `TypeId` of the cached value.
//! Concurrent first uses may each compute the value; the first one published
//! wins and every caller gets that same `Arc`.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

type Entry = Arc<dyn Any + Send + Sync>;

/// Compute-once, publish-once cache keyed by value type.
#[derive(Default)]
pub struct TypeCache {
    entries: RwLock<HashMap<TypeId, Entry>>,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache
    pub fn global() -> &'static TypeCache {
        static GLOBAL: OnceLock<TypeCache> = OnceLock::new();
        GLOBAL.get_or_init(TypeCache::new)
    }

    /// Cached value of type `V`, if one was published.
    pub fn get<V>(&self) -> Option<Arc<V>>
    where
        V: Any + Send + Sync,
    {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&TypeId::of::<V>())
            .cloned()
            .and_then(|entry| entry.downcast::<V>().ok())
    }

    /// Get the cached `V`, computing and publishing it on first use.
    pub fn get_or_insert_with<V, F>(&self, init: F) -> Arc<V>
    where
        V: Any + Send + Sync,
        F: FnOnce() -> V,
    {
        match self.get_or_try_insert_with(|| Ok::<V, std::convert::Infallible>(init())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Like [`TypeCache::get_or_insert_with`], but failures are returned and not cached.
    pub fn get_or_try_insert_with<V, E, F>(&self, init: F) -> Result<Arc<V>, E>
    where
        V: Any + Send + Sync,
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get::<V>() {
            return Ok(value);
        }

        // Computed outside the lock: init may itself consult the cache.
        let computed: Entry = Arc::new(init()?);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let published = entries
            .entry(TypeId::of::<V>())
            .or_insert(computed)
            .clone();
        drop(entries);

        Ok(published
            .downcast::<V>()
            .unwrap_or_else(|_| unreachable!("type cache entries are keyed by their own TypeId")))
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    struct Expensive(usize);

    #[test]
    fn test_computes_once() {
        let cache = TypeCache::new();
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_insert_with(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Expensive(7)
        });
        let second = cache.get_or_insert_with(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Expensive(8)
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.0, 7);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_failures_are_not_cached() {
        let cache = TypeCache::new();

        let failed: Result<Arc<Expensive>, &str> = cache.get_or_try_insert_with(|| Err("boom"));
        assert!(failed.is_err());
        assert!(cache.is_empty());

        let ok: Result<Arc<Expensive>, &str> = cache.get_or_try_insert_with(|| Ok(Expensive(1)));
        assert_eq!(ok.unwrap().0, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_first_use_publishes_one_value() {
        let cache = Arc::new(TypeCache::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get_or_insert_with(|| Expensive(i)).0)
            })
            .collect();

        let seen: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(seen.windows(2).all(|pair| pair[0] == pair[1]));
    }
}
