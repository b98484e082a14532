pub mod memory;

pub use memory::MemoryRouteCache;

use crate::constants::CACHE_KEY_DECIMALS;
use crate::models::{Coordinates, RoutedPath};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Cache for computed routes, keyed by the ordered waypoint sequence.
///
/// Only engine-computed routes belong here. Approximate fallbacks are
/// never inserted, so a degraded result can not outlive the outage that
/// produced it.
#[async_trait]
pub trait RouteCache: Send + Sync {
    async fn get_cached_path(&self, key: &str) -> Option<RoutedPath>;
    async fn cache_path(&self, key: &str, path: &RoutedPath);
    async fn get_stats(&self) -> CacheStats;
}

/// Generate a cache key for an ordered waypoint sequence.
/// Coordinates are rounded to 6 decimal places (~11cm) so float jitter
/// from repeated map interactions maps to the same entry. Order matters:
/// a reversed route is a different route.
pub fn route_cache_key(points: &[Coordinates]) -> String {
    let mut hasher = DefaultHasher::new();

    let multiplier = 10_f64.powi(CACHE_KEY_DECIMALS as i32);
    for point in points {
        let lat = (point.lat * multiplier).round() as i64;
        let lng = (point.lng * multiplier).round() as i64;
        lat.hash(&mut hasher);
        lng.hash(&mut hasher);
    }
    points.len().hash(&mut hasher);

    format!("route:{:x}", hasher.finish())
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}
