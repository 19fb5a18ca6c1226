//! Time-bounded response cache.
//!
//! Entries expire after their TTL. Reads never return an expired entry, and a
//! background thread periodically purges expired entries so memory stays
//! bounded even for keys that are never read again. The thread stops when the
//! cache is closed or dropped.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

type Entries<V> = Arc<RwLock<HashMap<String, Entry<V>>>>;

/// Stop signal and handle of the sweep thread
struct Sweeper {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Cache is a thread-safe key/value store whose entries expire.
pub struct Cache<V> {
    entries: Entries<V>,
    default_ttl: Duration,
    sweeper: Mutex<Option<Sweeper>>,
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a new cache
    ///
    /// # Arguments
    /// * `default_ttl` - TTL used by `set` when none is given
    /// * `sweep_interval` - Delay between purges of expired entries, zero disables the sweep
    pub fn new(default_ttl: Duration, sweep_interval: Duration) -> Self {
        let entries: Entries<V> = Arc::new(RwLock::new(HashMap::new()));
        let sweeper = if sweep_interval.is_zero() {
            None
        } else {
            spawn_sweeper(Arc::clone(&entries), sweep_interval)
        };

        Cache {
            entries,
            default_ttl,
            sweeper: Mutex::new(sweeper),
        }
    }

    /// Store a value, replacing any previous entry for the key
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let expires_at = expiry_after(ttl.unwrap_or(self.default_ttl));
        self.entries
            .write()
            .insert(key.into(), Entry { value, expires_at });
    }

    /// Get a value if present and not yet expired
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    /// Remove the entry for a key
    pub fn remove(&self, key: &str) -> Option<V> {
        self.entries.write().remove(key).map(|entry| entry.value)
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Remove every expired entry now, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        purge(&self.entries)
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Default TTL applied by `set`
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Stop the background sweep and wait for it to exit.
    ///
    /// Idempotent. The cache remains usable afterwards; expired entries are
    /// still hidden from `get` but are only removed by `purge_expired`.
    pub fn close(&self) {
        let sweeper = self.sweeper.lock().take();
        if let Some(Sweeper { stop_tx, handle }) = sweeper {
            // the receiver may already be gone if the thread exited
            let _ = stop_tx.send(());
            if handle.join().is_err() {
                tracing::warn!("cache sweep thread panicked");
            }
        }
    }
}

impl<V> Drop for Cache<V> {
    fn drop(&mut self) {
        if let Some(Sweeper { stop_tx, handle }) = self.sweeper.get_mut().take() {
            let _ = stop_tx.send(());
            let _ = handle.join();
        }
    }
}

/// Deadline `ttl` from now, saturating at a far-future instant
fn expiry_after(ttl: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(ttl)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Roughly a century, used when a TTL does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

fn purge<V>(entries: &RwLock<HashMap<String, Entry<V>>>) -> usize {
    let now = Instant::now();
    let mut entries = entries.write();
    let before = entries.len();
    entries.retain(|_, entry| entry.expires_at > now);
    before - entries.len()
}

fn spawn_sweeper<V>(entries: Entries<V>, interval: Duration) -> Option<Sweeper>
where
    V: Send + Sync + 'static,
{
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    let spawned = thread::Builder::new()
        .name("ds-cache-sweep".to_string())
        .spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    let purged = purge(&entries);
                    if purged > 0 {
                        tracing::debug!(purged, "swept expired cache entries");
                    }
                }
                // stop requested or the cache is gone
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
            }
        });

    match spawned {
        Ok(handle) => Some(Sweeper { stop_tx, handle }),
        Err(error) => {
            tracing::warn!(%error, "failed to start cache sweep thread");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_before_and_after_ttl() {
        let cache: Cache<String> = Cache::new(Duration::from_secs(60), Duration::ZERO);
        cache.set("a", "value".to_string(), Some(Duration::from_millis(80)));

        assert_eq!(cache.get("a"), Some("value".to_string()));

        thread::sleep(Duration::from_millis(120));
        assert_eq!(cache.get("a"), None);
        // not swept yet, only hidden
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_set_overwrites_and_uses_default_ttl() {
        let cache: Cache<u32> = Cache::new(Duration::from_secs(60), Duration::ZERO);
        cache.set("k", 1, None);
        cache.set("k", 2, None);

        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.default_ttl(), Duration::from_secs(60));

        assert_eq!(cache.remove("k"), Some(2));
        assert_eq!(cache.remove("k"), None);
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let cache: Cache<u32> = Cache::new(Duration::MAX, Duration::ZERO);
        cache.set("forever", 1, None);
        cache.set("also", 2, Some(Duration::MAX));

        assert_eq!(cache.get("forever"), Some(1));
        assert_eq!(cache.get("also"), Some(2));
        assert_eq!(cache.purge_expired(), 0);
    }

    #[test]
    fn test_clear() {
        let cache: Cache<u32> = Cache::new(Duration::from_secs(60), Duration::ZERO);
        cache.set("a", 1, None);
        cache.set("b", 2, None);
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_purge_expired() {
        let cache: Cache<u32> = Cache::new(Duration::from_secs(60), Duration::ZERO);
        cache.set("short", 1, Some(Duration::from_millis(10)));
        cache.set("long", 2, None);

        thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("long"), Some(2));
    }

    #[test]
    fn test_background_sweep_removes_expired() {
        let cache: Cache<u32> = Cache::new(Duration::from_millis(20), Duration::from_millis(25));
        cache.set("a", 1, None);
        cache.set("b", 2, Some(Duration::from_secs(60)));

        thread::sleep(Duration::from_millis(200));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_close_stops_sweep() {
        let cache: Cache<u32> = Cache::new(Duration::from_millis(10), Duration::from_millis(20));
        cache.close();
        cache.close();

        cache.set("a", 1, None);
        thread::sleep(Duration::from_millis(100));

        // expired but still stored because nothing sweeps anymore
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_access() {
        let cache: Arc<Cache<usize>> =
            Arc::new(Cache::new(Duration::from_millis(5), Duration::from_millis(1)));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..500 {
                        let key = format!("{}-{}", t, i % 16);
                        cache.set(key.clone(), i, None);
                        let _ = cache.get(&key);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        cache.close();
    }
}
