//! In-memory TTL cache for read-path API responses.
//!
//! Expiry is passive: staleness is checked at read time, and each insert also
//! schedules an eviction task so unread entries do not accumulate between
//! reads. Mutations never invalidate entries; stale reads after a write are
//! bounded by the TTLs below.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant, sleep_until};

/// TTL for per-channel video listings.
pub const CHANNEL_VIDEOS_TTL: Duration = Duration::from_secs(3 * 60);
/// TTL for account-level data (user profile, subscriptions).
pub const ACCOUNT_DATA_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
    value: Value,
    inserted_at: Instant,
    ttl: Duration,
    /// Ties the scheduled eviction to this exact insert, so a timer from an
    /// overwritten entry cannot evict its replacement.
    generation: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    next_generation: u64,
}

/// Process-wide response cache, shared by all callers for the lifetime of
/// the background process.
#[derive(Clone, Default)]
pub struct ResponseCache {
    inner: Arc<Mutex<CacheState>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value if it is still within its TTL. A stale entry
    /// found here is removed on the spot.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let mut state = self.inner.lock().await;
        match state.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < entry.ttl => {
                tracing::trace!(key, "cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                tracing::trace!(key, "cache entry expired");
                state.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value` under `key` and schedules its eviction after `ttl`.
    pub async fn put(&self, key: &str, value: Value, ttl: Duration) {
        let deadline = Instant::now() + ttl;
        let generation = {
            let mut state = self.inner.lock().await;
            state.next_generation += 1;
            let generation = state.next_generation;
            state.entries.insert(
                key.to_owned(),
                CacheEntry {
                    value,
                    inserted_at: Instant::now(),
                    ttl,
                    generation,
                },
            );
            generation
        };

        let inner = Arc::clone(&self.inner);
        let key = key.to_owned();
        tokio::spawn(async move {
            sleep_until(deadline).await;
            let mut state = inner.lock().await;
            let still_current = state
                .entries
                .get(&key)
                .is_some_and(|entry| entry.generation == generation);
            if still_current {
                tracing::trace!(key, "evicting expired cache entry");
                state.entries.remove(&key);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn serves_hits_within_ttl_and_expires_after() {
        let cache = ResponseCache::new();
        cache.put("subscriptions", json!(["a"]), ACCOUNT_DATA_TTL).await;

        assert_eq!(cache.get("subscriptions").await, Some(json!(["a"])));

        advance(ACCOUNT_DATA_TTL - Duration::from_secs(1)).await;
        assert_eq!(cache.get("subscriptions").await, Some(json!(["a"])));

        advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("subscriptions").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_parameter_sets_do_not_collide() {
        let cache = ResponseCache::new();
        cache.put("channel_videos_UC1_5", json!(5), CHANNEL_VIDEOS_TTL).await;
        cache.put("channel_videos_UC1_10", json!(10), CHANNEL_VIDEOS_TTL).await;

        assert_eq!(cache.get("channel_videos_UC1_5").await, Some(json!(5)));
        assert_eq!(cache.get("channel_videos_UC1_10").await, Some(json!(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn unread_entries_are_evicted_eagerly() {
        let cache = ResponseCache::new();
        cache.put("user_info", json!({"id": "me"}), ACCOUNT_DATA_TTL).await;

        advance(ACCOUNT_DATA_TTL + Duration::from_secs(1)).await;
        // Let the scheduled eviction task run.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert!(cache.inner.lock().await.entries.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn replacement_entry_survives_the_old_timer() {
        let cache = ResponseCache::new();
        cache.put("subscriptions", json!("old"), Duration::from_secs(60)).await;

        advance(Duration::from_secs(30)).await;
        cache.put("subscriptions", json!("new"), Duration::from_secs(600)).await;

        // The first insert's timer fires at t=60; the replacement must stay.
        advance(Duration::from_secs(40)).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert_eq!(cache.get("subscriptions").await, Some(json!("new")));
    }
}
