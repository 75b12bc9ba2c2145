//! Credential-scoped client cache.
//!
//! Maps an execution-scope [`CacheKey`] to a previously constructed client so that
//! repeated calls inside the same execution skip credential resolution and client
//! setup. Entries expire a fixed TTL after creation and are only dropped lazily on
//! lookup or by [`ClientCache::sweep`].
//!
//! Concurrent misses on the same key race: every caller runs its own factory and
//! the last store wins. The map lock is never held while a factory runs.

use crate::clock::{Clock, SystemClock};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

pub const CLIENT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    node_id: String,
    node_type: String,
    execution_id: String,
}

impl CacheKey {
    pub fn new(
        node_id: impl Into<String>,
        node_type: impl Into<String>,
        execution_id: impl Into<String>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            node_type: node_type.into(),
            execution_id: execution_id.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.node_id, self.node_type, self.execution_id)
    }
}

#[derive(Debug)]
struct CacheEntry<H> {
    handle: H,
    created_at: Instant,
}

pub struct ClientCache<H> {
    entries: Mutex<HashMap<CacheKey, CacheEntry<H>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<H: Clone> ClientCache<H> {
    pub fn new() -> Self {
        Self::with_clock(CLIENT_CACHE_TTL, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached handle for `key`, or runs `factory` and caches its result.
    ///
    /// A failing factory leaves the cache untouched and its error is returned as is.
    pub async fn get_or_create<F, Fut, E>(&self, key: &CacheKey, factory: F) -> Result<H, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<H, E>>,
    {
        if let Some(handle) = self.lookup(key) {
            debug!(cache_key = %key, "Using cached client");
            return Ok(handle);
        }

        let handle = factory().await?;

        let created_at = self.clock.now();
        self.entries().insert(
            key.clone(),
            CacheEntry {
                handle: handle.clone(),
                created_at,
            },
        );
        debug!(cache_key = %key, "Created and cached new client");

        Ok(handle)
    }

    /// Removes every entry whose age has reached the TTL.
    pub fn sweep(&self) {
        let now = self.clock.now();
        let ttl = self.ttl;
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.created_at) < ttl);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "Swept expired clients");
        }
    }

    /// Age of the entry stored for `key`, expired or not.
    pub fn age_of(&self, key: &CacheKey) -> Option<Duration> {
        let now = self.clock.now();
        self.entries()
            .get(key)
            .map(|entry| now.saturating_duration_since(entry.created_at))
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn lookup(&self, key: &CacheKey) -> Option<H> {
        let now = self.clock.now();
        self.entries()
            .get(key)
            .filter(|entry| now.saturating_duration_since(entry.created_at) < self.ttl)
            .map(|entry| entry.handle.clone())
    }

    // Every critical section leaves the map consistent, so a poisoned lock is still usable.
    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry<H>>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl<H: Clone> Default for ClientCache<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache_with_manual_clock() -> (ClientCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = ClientCache::with_clock(CLIENT_CACHE_TTL, clock.clone());
        (cache, clock)
    }

    fn key(node_id: &str) -> CacheKey {
        CacheKey::new(node_id, "BedrockClaude", "exec-1")
    }

    async fn counted(
        cache: &ClientCache<String>,
        key: &CacheKey,
        calls: &AtomicUsize,
        handle: &str,
    ) -> String {
        cache
            .get_or_create(key, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(handle.to_string())
            })
            .await
            .unwrap()
    }

    #[test]
    fn should_format_cache_key_from_execution_scope() {
        let key = CacheKey::new("node-7", "BedrockEmbedding", "exec-42");
        assert_eq!(key.to_string(), "node-7_BedrockEmbedding_exec-42");
    }

    #[test]
    fn should_use_five_minute_ttl_by_default() {
        let cache: ClientCache<String> = ClientCache::new();
        assert_eq!(cache.ttl(), Duration::from_secs(300));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn should_invoke_factory_once_for_immediate_repeat_calls() {
        let (cache, _clock) = cache_with_manual_clock();
        let calls = AtomicUsize::new(0);
        let k = key("node-1");

        let first = counted(&cache, &k, &calls, "H1").await;
        let second = counted(&cache, &k, &calls, "H2").await;

        assert_eq!(first, "H1");
        assert_eq!(second, "H1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn should_rebuild_client_after_ttl_has_elapsed() {
        let (cache, clock) = cache_with_manual_clock();
        let calls = AtomicUsize::new(0);
        let k = key("node-1");

        counted(&cache, &k, &calls, "H1").await;
        clock.advance(Duration::from_secs(600));
        let handle = counted(&cache, &k, &calls, "H2").await;

        assert_eq!(handle, "H2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn should_treat_entry_exactly_at_ttl_as_expired() {
        let (cache, clock) = cache_with_manual_clock();
        let calls = AtomicUsize::new(0);
        let k = key("node-1");

        counted(&cache, &k, &calls, "H1").await;
        clock.advance(CLIENT_CACHE_TTL - Duration::from_millis(1));
        assert_eq!(counted(&cache, &k, &calls, "H2").await, "H1");

        clock.advance(Duration::from_millis(1));
        assert_eq!(counted(&cache, &k, &calls, "H2").await, "H2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn should_not_cache_factory_failures() {
        let (cache, _clock) = cache_with_manual_clock();
        let calls = &AtomicUsize::new(0);
        let k = key("node-1");

        let result = cache
            .get_or_create(&k, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>("AWS credentials not found".to_string())
            })
            .await;

        assert_eq!(result, Err("AWS credentials not found".to_string()));
        assert!(cache.is_empty());

        let handle = counted(&cache, &k, calls, "H1").await;
        assert_eq!(handle, "H1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn should_keep_expired_entry_when_rebuild_fails() {
        let (cache, clock) = cache_with_manual_clock();
        let calls = AtomicUsize::new(0);
        let k = key("node-1");

        counted(&cache, &k, &calls, "H1").await;
        clock.advance(CLIENT_CACHE_TTL);

        let result = cache
            .get_or_create(&k, || async { Err::<String, _>("boom") })
            .await;

        assert_eq!(result, Err("boom"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.age_of(&k), Some(CLIENT_CACHE_TTL));
    }

    #[tokio::test]
    async fn should_sweep_only_expired_entries() {
        let (cache, clock) = cache_with_manual_clock();
        let calls = AtomicUsize::new(0);

        counted(&cache, &key("old"), &calls, "H-old").await;
        clock.advance(Duration::from_secs(200));
        counted(&cache, &key("young"), &calls, "H-young").await;
        clock.advance(Duration::from_secs(100));

        // "old" is exactly 300s old, "young" is 100s old
        cache.sweep();

        assert_eq!(cache.len(), 1);
        assert!(cache.age_of(&key("old")).is_none());
        assert_eq!(cache.age_of(&key("young")), Some(Duration::from_secs(100)));
    }

    #[test]
    fn should_sweep_empty_cache_without_effect() {
        let (cache, _clock) = cache_with_manual_clock();
        cache.sweep();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn should_follow_ttl_scenario_timeline() {
        let (cache, clock) = cache_with_manual_clock();
        let k1 = key("K1");
        let f2_calls = AtomicUsize::new(0);

        let h1 = cache
            .get_or_create(&k1, || async { Ok::<_, String>("H1".to_string()) })
            .await
            .unwrap();
        assert_eq!(h1, "H1");

        clock.advance(Duration::from_secs(100));
        assert_eq!(counted(&cache, &k1, &f2_calls, "H2").await, "H1");
        assert_eq!(f2_calls.load(Ordering::SeqCst), 0);

        clock.advance(Duration::from_secs(201));
        assert_eq!(counted(&cache, &k1, &f2_calls, "H2").await, "H2");
        assert_eq!(f2_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.age_of(&k1), Some(Duration::ZERO));
    }

    #[tokio::test]
    async fn should_let_last_writer_win_on_concurrent_miss_for_same_key() {
        let (cache, _clock) = cache_with_manual_clock();
        let k = key("node-1");
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let slow = cache.get_or_create(&k, || async move {
            rx.await.unwrap();
            Ok::<_, String>("slow".to_string())
        });
        let fast = cache.get_or_create(&k, || async move {
            tx.send(()).unwrap();
            Ok::<_, String>("fast".to_string())
        });

        let (slow, fast) = tokio::join!(slow, fast);

        assert_eq!(slow.unwrap(), "slow");
        assert_eq!(fast.unwrap(), "fast");
        let cached = cache
            .get_or_create(&k, || async { Ok::<_, String>("unused".to_string()) })
            .await
            .unwrap();
        assert_eq!(cached, "slow");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn should_isolate_distinct_keys_under_concurrency() {
        let cache: Arc<ClientCache<String>> = Arc::new(ClientCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for i in 0..16 {
            let cache = cache.clone();
            let calls = calls.clone();
            tasks.push(tokio::spawn(async move {
                let k = CacheKey::new(format!("node-{i}"), "BedrockEmbedding", "exec-1");
                let mut seen = Vec::new();
                for _ in 0..5 {
                    let calls = calls.clone();
                    let handle = cache
                        .get_or_create(&k, || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::task::yield_now().await;
                            Ok::<_, String>(format!("client-{i}"))
                        })
                        .await
                        .unwrap();
                    seen.push(handle);
                }
                (i, seen)
            }));
        }

        for task in tasks {
            let (i, seen) = task.await.unwrap();
            assert!(seen.iter().all(|h| *h == format!("client-{i}")));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 16);
        assert_eq!(cache.len(), 16);
    }
}
