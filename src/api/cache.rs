//! In-memory TTL caches for decoded API responses.
//!
//! One cache per data class, each with its own TTL: leaderboard listings go
//! stale in minutes, game progress can live longer. Expired entries are
//! purged on access; there is no background sweep because every read checks
//! freshness.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::api::models::{GameProgress, RankedEntry};
use crate::settings::TrackerSettings;

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

/// String-keyed TTL cache for one data class.
pub struct TtlCache<V: Clone> {
    default_ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a fresh entry. Absence covers both never-stored and expired;
    /// an expired entry is removed before returning.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if now - entry.stored_at < entry.ttl => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        self.entries.write().await.remove(key);
        None
    }

    pub async fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl).await;
    }

    pub async fn insert_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            stored_at: Instant::now(),
            ttl,
        };
        self.entries.write().await.insert(key.into(), entry);
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Typed caches for the achievement API's data classes.
pub struct ResponseCache {
    /// Ranked listings, volatile TTL.
    pub leaderboards: TtlCache<Vec<RankedEntry>>,
    /// Per-subject game progress, default TTL.
    pub progress: TtlCache<GameProgress>,
}

impl ResponseCache {
    pub fn new(settings: &TrackerSettings) -> Self {
        Self {
            leaderboards: TtlCache::new(settings.volatile_cache_ttl()),
            progress: TtlCache::new(settings.default_cache_ttl()),
        }
    }

    pub async fn clear_all(&self) {
        self.leaderboards.clear().await;
        self.progress.clear().await;
    }

    pub async fn stats(&self) -> ResponseCacheStats {
        ResponseCacheStats {
            leaderboard_count: self.leaderboards.entry_count().await,
            progress_count: self.progress.entry_count().await,
        }
    }
}

/// Cache statistics for observability.
#[derive(Debug, Clone)]
pub struct ResponseCacheStats {
    pub leaderboard_count: usize,
    pub progress_count: usize,
}

impl ResponseCacheStats {
    pub fn total(&self) -> usize {
        self.leaderboard_count + self.progress_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_set_get() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("board:1", 7).await;
        assert_eq!(cache.get("board:1").await, Some(7));
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("absent").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_purged_on_access() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("board:1", 7).await;

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.get("board:1").await, None);
        assert_eq!(cache.entry_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_entry_ttl_overrides_default() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        cache
            .insert_with_ttl("volatile", 1, Duration::from_secs(5))
            .await;
        cache.insert("slow", 2).await;

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(cache.get("volatile").await, None);
        assert_eq!(cache.get("slow").await, Some(2));
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("board:1", 7).await;
        cache.invalidate("board:1").await;
        assert_eq!(cache.get("board:1").await, None);
    }

    #[tokio::test]
    async fn test_response_cache_stats() {
        let cache = ResponseCache::new(&TrackerSettings::default());
        cache.leaderboards.insert("board:1", Vec::new()).await;
        cache
            .progress
            .insert("alice:game-9", GameProgress::default())
            .await;

        let stats = cache.stats().await;
        assert_eq!(stats.leaderboard_count, 1);
        assert_eq!(stats.progress_count, 1);
        assert_eq!(stats.total(), 2);

        cache.clear_all().await;
        assert_eq!(cache.stats().await.total(), 0);
    }
}
