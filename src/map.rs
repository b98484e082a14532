use crate::models::{Coordinates, RoutedPath, Waypoint, WaypointId, WaypointRole};

/// Everything the surface needs to draw one waypoint marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub id: WaypointId,
    pub coords: Coordinates,
    pub label: String,
    pub role: WaypointRole,
}

/// Rendering adapter over whatever actually draws the map.
///
/// The planner owns its surface and drives it with whole-state calls:
/// markers are always replaced as a set, the route is drawn or cleared
/// wholesale. Implementations that hold external library handles should
/// release them in `Drop`; the planner drops the surface when its event
/// loop exits.
///
/// Route styling is the surface's business. `RoutedPath::approximate`
/// tells it when to render a degraded (for example dashed) line.
pub trait MapSurface: Send {
    fn set_markers(&mut self, markers: &[MarkerSpec]);
    fn set_route(&mut self, route: &RoutedPath);
    fn clear_route(&mut self);
    /// Center the view, used when the first waypoint is placed.
    fn focus(&mut self, center: Coordinates);
}

/// Surface that draws nothing. For headless use and tests that only care
/// about planner state.
#[derive(Debug, Default)]
pub struct NullSurface;

impl MapSurface for NullSurface {
    fn set_markers(&mut self, _markers: &[MarkerSpec]) {}
    fn set_route(&mut self, _route: &RoutedPath) {}
    fn clear_route(&mut self) {}
    fn focus(&mut self, _center: Coordinates) {}
}

/// Build the marker set for the current waypoint list, roles derived
/// from position.
pub fn markers_for(waypoints: &[Waypoint]) -> Vec<MarkerSpec> {
    let len = waypoints.len();
    waypoints
        .iter()
        .enumerate()
        .map(|(index, waypoint)| MarkerSpec {
            id: waypoint.id,
            coords: waypoint.coords,
            label: waypoint.address.clone(),
            role: WaypointRole::for_position(index, len),
        })
        .collect()
}
