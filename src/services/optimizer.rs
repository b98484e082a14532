use crate::config::RoutingConfig;
use crate::constants::{MAX_ROUTE_WAYPOINTS, MIN_OPTIMIZE_WAYPOINTS};
use crate::error::{PlannerError, Result};
use crate::models::Coordinates;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Reorders intermediate stops to shorten the overall trip.
///
/// Returns the new visiting order as original indices: element `k` is the
/// index (in the submitted sequence) of the waypoint to visit at position
/// `k`. The first and last points are pinned, so a valid result always
/// starts with `0` and ends with `len - 1`.
#[async_trait]
pub trait TripOptimizer: Send + Sync {
    async fn optimize(&self, points: &[Coordinates]) -> Result<Vec<usize>>;
}

/// Client for the OSRM trip service.
#[derive(Clone)]
pub struct OsrmTripClient {
    client: Client,
    base_url: String,
    profile: String,
    request_timeout: Duration,
}

impl OsrmTripClient {
    pub fn new(config: &RoutingConfig) -> Self {
        OsrmTripClient {
            client: Client::new(),
            base_url: config.base_url.clone(),
            profile: config.profile.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    fn validate_points(points: &[Coordinates]) -> Result<()> {
        if points.len() < MIN_OPTIMIZE_WAYPOINTS {
            return Err(PlannerError::OptimizationUnavailable(format!(
                "Optimization needs at least {} waypoints",
                MIN_OPTIMIZE_WAYPOINTS
            )));
        }
        if points.len() > MAX_ROUTE_WAYPOINTS {
            return Err(PlannerError::InvalidRequest(format!(
                "Maximum {} waypoints allowed",
                MAX_ROUTE_WAYPOINTS
            )));
        }
        Ok(())
    }

    /// Invert OSRM's waypoint mapping into visit order.
    ///
    /// OSRM reports, for each input waypoint, the position it was assigned
    /// in the trip (`waypoint_index`). We want the inverse: for each trip
    /// position, which input waypoint goes there.
    fn visit_order(waypoints: &[OsrmTripWaypoint], len: usize) -> Result<Vec<usize>> {
        if waypoints.len() != len {
            return Err(PlannerError::OptimizationUnavailable(format!(
                "Expected {} waypoints in trip, got {}",
                len,
                waypoints.len()
            )));
        }

        let mut order = vec![usize::MAX; len];
        for (input_index, waypoint) in waypoints.iter().enumerate() {
            let position = waypoint.waypoint_index;
            if position >= len || order[position] != usize::MAX {
                return Err(PlannerError::OptimizationUnavailable(
                    "Trip response is not a permutation".to_string(),
                ));
            }
            order[position] = input_index;
        }

        // source=first and destination=last pin the endpoints; anything
        // else is a malformed response.
        if order[0] != 0 || order[len - 1] != len - 1 {
            return Err(PlannerError::OptimizationUnavailable(
                "Trip response moved a pinned endpoint".to_string(),
            ));
        }

        Ok(order)
    }
}

#[async_trait]
impl TripOptimizer for OsrmTripClient {
    async fn optimize(&self, points: &[Coordinates]) -> Result<Vec<usize>> {
        Self::validate_points(points)?;

        let coordinates_str = points
            .iter()
            .map(|c| format!("{:.6},{:.6}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";");

        let url = format!(
            "{}/trip/v1/{}/{}",
            self.base_url, self.profile, coordinates_str
        );

        tracing::debug!("OSRM trip request: {} waypoints", points.len());

        let response = self
            .client
            .get(&url)
            .query(&[
                ("source", "first"),
                ("destination", "last"),
                ("roundtrip", "false"),
            ])
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| {
                PlannerError::OptimizationUnavailable(format!("Request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!("OSRM trip HTTP error {}", status);
            return Err(PlannerError::OptimizationUnavailable(format!(
                "HTTP {}",
                status
            )));
        }

        let body: OsrmTripApiResponse = response.json().await.map_err(|e| {
            PlannerError::OptimizationUnavailable(format!("Failed to parse response: {}", e))
        })?;

        if body.code != "Ok" {
            return Err(PlannerError::OptimizationUnavailable(format!(
                "OSRM returned {}: {}",
                body.code,
                body.message.unwrap_or_default()
            )));
        }

        let order = Self::visit_order(&body.waypoints, points.len())?;
        tracing::debug!("Optimized visit order: {:?}", order);
        Ok(order)
    }
}

// OSRM trip API response types

#[derive(Debug, Deserialize)]
struct OsrmTripApiResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    waypoints: Vec<OsrmTripWaypoint>,
}

#[derive(Debug, Deserialize)]
struct OsrmTripWaypoint {
    /// Position this input waypoint was assigned in the optimized trip.
    waypoint_index: usize,
}
