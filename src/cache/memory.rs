use crate::cache::{CacheStats, RouteCache};
use crate::models::RoutedPath;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory route cache backed by moka with TTL and bounded capacity.
/// All methods are `&self`, no locking needed.
pub struct MemoryRouteCache {
    paths: Cache<String, Arc<RoutedPath>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryRouteCache {
    pub fn new(ttl_seconds: u64, max_capacity: u64) -> Self {
        let paths = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .max_capacity(max_capacity)
            .build();

        MemoryRouteCache {
            paths,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl RouteCache for MemoryRouteCache {
    async fn get_cached_path(&self, key: &str) -> Option<RoutedPath> {
        match self.paths.get(key).await {
            Some(arc_path) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Route cache hit: {}", key);
                Some((*arc_path).clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Route cache miss: {}", key);
                None
            }
        }
    }

    async fn cache_path(&self, key: &str, path: &RoutedPath) {
        self.paths.insert(key.to_string(), Arc::new(path.clone())).await;
        tracing::debug!("Cached route ({} points): {}", path.path.len(), key);
    }

    async fn get_stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let hit_rate = if hits + misses > 0 {
            (hits as f64 / (hits + misses) as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            hit_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;

    fn make_test_path(distance_meters: f64) -> RoutedPath {
        RoutedPath {
            distance_meters,
            duration_minutes: 30.0,
            path: vec![
                Coordinates::new(48.8566, 2.3522).unwrap(),
                Coordinates::new(48.8600, 2.3600).unwrap(),
            ],
            approximate: false,
        }
    }

    #[tokio::test]
    async fn missing_key_returns_none() {
        let cache = MemoryRouteCache::new(3600, 100);
        assert!(cache.get_cached_path("no-such-sequence").await.is_none());
    }

    #[tokio::test]
    async fn stores_and_returns_path() {
        let cache = MemoryRouteCache::new(3600, 100);
        let path = make_test_path(7200.0);

        cache.cache_path("seq-a", &path).await;
        let cached = cache.get_cached_path("seq-a").await.unwrap();

        assert_eq!(cached.distance_meters, 7200.0);
        assert_eq!(cached.path.len(), 2);
        assert!(!cached.approximate);
    }

    #[tokio::test]
    async fn stats_count_hits_and_misses() {
        let cache = MemoryRouteCache::new(3600, 100);
        cache.cache_path("seq-a", &make_test_path(7200.0)).await;

        cache.get_cached_path("absent").await;
        for _ in 0..3 {
            cache.get_cached_path("seq-a").await;
        }

        let stats = cache.get_stats().await;
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 75.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = MemoryRouteCache::new(1, 100);
        cache.cache_path("seq-a", &make_test_path(7200.0)).await;

        assert!(cache.get_cached_path("seq-a").await.is_some());

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(cache.get_cached_path("seq-a").await.is_none());
    }
}
