use crate::config::RoutingConfig;
use crate::constants::{MAX_ROUTE_WAYPOINTS, MIN_ROUTE_WAYPOINTS};
use crate::error::{PlannerError, Result};
use crate::models::{Coordinates, RoutedPath};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Road-following route computation through an ordered point sequence.
#[async_trait]
pub trait RoutingEngine: Send + Sync {
    async fn route(&self, points: &[Coordinates]) -> Result<RoutedPath>;
}

/// Client for the OSRM HTTP API (route service).
#[derive(Clone)]
pub struct OsrmClient {
    client: Client,
    base_url: String,
    profile: String,
    request_timeout: Duration,
}

impl OsrmClient {
    pub fn new(config: &RoutingConfig) -> Self {
        OsrmClient {
            client: Client::new(),
            base_url: config.base_url.clone(),
            profile: config.profile.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Format coordinates as OSRM expects: "lng,lat;lng,lat;..." with
    /// 6 decimal places.
    fn format_coordinates(points: &[Coordinates]) -> String {
        points
            .iter()
            .map(|c| format!("{:.6},{:.6}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";")
    }

    fn validate_points(points: &[Coordinates]) -> Result<()> {
        if points.len() < MIN_ROUTE_WAYPOINTS {
            return Err(PlannerError::InvalidRequest(format!(
                "A route needs at least {} waypoints",
                MIN_ROUTE_WAYPOINTS
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
}

#[async_trait]
impl RoutingEngine for OsrmClient {
    /// Fetch the best route through `points`, in the given order.
    /// Returns full geometry, distance and duration.
    async fn route(&self, points: &[Coordinates]) -> Result<RoutedPath> {
        Self::validate_points(points)?;

        let url = format!(
            "{}/route/v1/{}/{}",
            self.base_url,
            self.profile,
            Self::format_coordinates(points)
        );

        tracing::debug!(
            "OSRM route request: {} waypoints, profile {}",
            points.len(),
            self.profile
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("overview", "full"),
                ("geometries", "geojson"),
                ("steps", "false"),
            ])
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| PlannerError::RoutingApi(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!("OSRM HTTP error {}: {}", status, error_text);
            return Err(PlannerError::RoutingApi(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: OsrmRouteApiResponse = response
            .json()
            .await
            .map_err(|e| PlannerError::RoutingApi(format!("Failed to parse response: {}", e)))?;

        if body.code != "Ok" {
            return Err(PlannerError::RoutingApi(format!(
                "OSRM returned {}: {}",
                body.code,
                body.message.unwrap_or_default()
            )));
        }

        let route = body
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| PlannerError::RoutingApi("No routes found".to_string()))?;
        let routed = route.into_routed_path();

        tracing::debug!(
            "OSRM response: {:.2}km, {:.0}min, {} path points",
            routed.distance_km(),
            routed.duration_minutes,
            routed.path.len()
        );

        Ok(routed)
    }
}

// OSRM API response types

#[derive(Debug, Deserialize)]
struct OsrmRouteApiResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
    geometry: OsrmGeometry,
}

impl OsrmRoute {
    /// Engine result mapped to the crate's route shape. Distance stays in
    /// meters; duration converts from seconds to minutes.
    fn into_routed_path(self) -> RoutedPath {
        RoutedPath {
            distance_meters: self.distance,
            duration_minutes: self.duration / 60.0,
            path: self.geometry.to_coordinates(),
            approximate: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON order: lng first, then lat.
    coordinates: Vec<[f64; 2]>,
    #[allow(dead_code)]
    #[serde(rename = "type")]
    geometry_type: String,
}

impl OsrmGeometry {
    fn to_coordinates(&self) -> Vec<Coordinates> {
        self.coordinates
            .iter()
            .filter_map(|coord| Coordinates::new(coord[1], coord[0]).ok())
            .collect()
    }
}
