use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

/// Fetch-once cache keyed per entry.
///
/// Every key owns its own `OnceCell`. The map lock is held only while the
/// cell is looked up, so initialising one key never blocks another, and two
/// callers racing on the same key share a single initialisation. A failed
/// initialisation leaves the cell empty and the next caller tries again.
pub struct OnceCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    inner: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> OnceCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    async fn cell(&self, key: &K) -> Arc<OnceCell<V>> {
        let mut cells = self.inner.lock().await;
        Arc::clone(cells.entry(key.clone()).or_default())
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let cells = self.inner.lock().await;
        cells.get(key).and_then(|cell| cell.get().cloned())
    }

    pub async fn get_or_try_init<F, Fut, E>(&self, key: &K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = self.cell(key).await;
        if let Some(value) = cell.get() {
            debug!("Cache HIT for key: {:?}", key);
            return Ok(value.clone());
        }
        debug!("Cache MISS for key: {:?}", key);
        cell.get_or_try_init(init).await.cloned()
    }

    pub async fn len(&self) -> usize {
        let cells = self.inner.lock().await;
        cells.values().filter(|cell| cell.initialized()).count()
    }
}

impl<K, V> Default for OnceCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_cache_initialises_once() {
        let cache = OnceCache::<String, i32>::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        assert!(cache.get(&"key1".to_string()).await.is_none());

        for _ in 0..3 {
            let value = cache
                .get_or_try_init(&"key1".to_string(), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(123)
                })
                .await;
            assert_eq!(value, Ok(123));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(&"key1".to_string()).await, Some(123));
        assert!(cache.get(&"key2".to_string()).await.is_none());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = OnceCache::<String, i32>::new();

        let first = cache
            .get_or_try_init(&"key".to_string(), || async { Err::<i32, _>("offline") })
            .await;
        assert_eq!(first, Err("offline"));
        assert!(cache.get(&"key".to_string()).await.is_none());
        assert_eq!(cache.len().await, 0);

        let second = cache
            .get_or_try_init(&"key".to_string(), || async { Ok::<_, &str>(7) })
            .await;
        assert_eq!(second, Ok(7));
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_initialisation() {
        let cache = OnceCache::<String, i32>::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let init = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            Ok::<_, String>(5)
        };
        let key = "shared".to_string();
        let (a, b) = tokio::join!(
            cache.get_or_try_init(&key, init),
            cache.get_or_try_init(&key, init)
        );

        assert_eq!(a, Ok(5));
        assert_eq!(b, Ok(5));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
