use crate::models::Coordinates;
use serde::{Deserialize, Serialize};

/// A computed route between an ordered set of waypoints.
///
/// Either a road-following result from the routing engine, or a
/// straight-line estimate produced when the engine is unreachable or
/// rate-limited. Estimates carry `approximate: true` and are never cached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutedPath {
    pub distance_meters: f64,
    pub duration_minutes: f64,
    /// Route geometry, start to end. Straight segments between waypoints
    /// when approximate.
    pub path: Vec<Coordinates>,
    /// True when produced by the haversine estimator instead of the engine.
    pub approximate: bool,
}

impl RoutedPath {
    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    /// One-line summary for display, e.g. "12.3 km, 37 min".
    /// Approximate results are prefixed with "~".
    pub fn summary(&self) -> String {
        let prefix = if self.approximate { "~" } else { "" };
        format!(
            "{}{:.1} km, {:.0} min",
            prefix,
            self.distance_km(),
            self.duration_minutes
        )
    }
}
