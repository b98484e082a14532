use crate::cache::{route_cache_key, CacheStats, RouteCache};
use crate::config::RoutingConfig;
use crate::constants::{MAX_ROUTE_WAYPOINTS, MIN_ROUTE_WAYPOINTS};
use crate::error::{PlannerError, Result};
use crate::models::{Coordinates, RoutedPath};
use crate::services::osrm::RoutingEngine;
use crate::services::rate_limit::RateWindow;
use std::sync::Arc;
use std::time::Duration;

/// Route computation with caching, rate limiting and graceful degradation.
///
/// Lookup order per request: cache, then rate window, then the engine.
/// When the engine is unreachable or the window is exhausted, callers get
/// a straight-line estimate instead of an error. Estimates are transient:
/// they are not cached and a later attempt retries the engine.
///
/// Cache and rate window are owned by the instance. Two planners open at
/// once do not share a request budget.
pub struct RouteService {
    engine: Arc<dyn RoutingEngine>,
    cache: Arc<dyn RouteCache>,
    rate_window: RateWindow,
    fallback_pace_min_per_km: f64,
}

impl RouteService {
    pub fn new(
        engine: Arc<dyn RoutingEngine>,
        cache: Arc<dyn RouteCache>,
        config: &RoutingConfig,
    ) -> Self {
        RouteService {
            engine,
            cache,
            rate_window: RateWindow::new(
                config.rate_limit_max_requests,
                Duration::from_secs(config.rate_limit_window_secs),
            ),
            fallback_pace_min_per_km: config.fallback_pace_min_per_km,
        }
    }

    /// Compute a route through `points` in order.
    ///
    /// Returns an error only for invalid input. Engine trouble degrades to
    /// an approximate result with `approximate: true`.
    pub async fn compute_route(&self, points: &[Coordinates]) -> Result<RoutedPath> {
        if points.len() < MIN_ROUTE_WAYPOINTS {
            return Err(PlannerError::InvalidRequest(
                "At least 2 waypoints required".to_string(),
            ));
        }
        if points.len() > MAX_ROUTE_WAYPOINTS {
            return Err(PlannerError::InvalidRequest(format!(
                "Maximum {} waypoints allowed",
                MAX_ROUTE_WAYPOINTS
            )));
        }

        let key = route_cache_key(points);
        if let Some(cached) = self.cache.get_cached_path(&key).await {
            return Ok(cached);
        }

        if !self.rate_window.try_acquire() {
            tracing::warn!(
                waypoints = points.len(),
                "Routing rate limit reached, serving straight-line estimate"
            );
            return Ok(self.estimate(points));
        }

        match self.engine.route(points).await {
            Ok(path) => {
                self.cache.cache_path(&key, &path).await;
                Ok(path)
            }
            Err(PlannerError::InvalidRequest(msg)) => Err(PlannerError::InvalidRequest(msg)),
            Err(e) => {
                tracing::warn!(
                    waypoints = points.len(),
                    "Routing engine failed ({}), serving straight-line estimate",
                    e
                );
                Ok(self.estimate(points))
            }
        }
    }

    /// Straight-line estimate: haversine distance summed over consecutive
    /// pairs, duration from a fixed pace heuristic.
    fn estimate(&self, points: &[Coordinates]) -> RoutedPath {
        let distance_km: f64 = points
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .sum();

        RoutedPath {
            distance_meters: distance_km * 1000.0,
            duration_minutes: distance_km * self.fallback_pace_min_per_km,
            path: points.to_vec(),
            approximate: true,
        }
    }

    /// Requests still admissible in the current rate window.
    pub fn requests_remaining(&self) -> usize {
        self.rate_window.remaining()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.get_stats().await
    }
}
