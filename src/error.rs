use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    /// Forward geocoding produced no usable match for the query.
    #[error("Address not found: {0}")]
    AddressNotFound(String),

    /// Geocoding transport or protocol failure, distinct from "no match".
    #[error("Geocoding service error: {0}")]
    Geocoding(String),

    /// Routing engine request failed. `RouteService` recovers this into an
    /// approximate result; it only escapes from the raw engine client.
    #[error("Routing engine error: {0}")]
    RoutingApi(String),

    /// Optimizer preconditions not met or the service failed. The waypoint
    /// order is left untouched in either case.
    #[error("Route optimization unavailable: {0}")]
    OptimizationUnavailable(String),

    /// The map rendering surface failed to initialize. Fatal to the planner
    /// instance; never retried silently.
    #[error("Map surface initialization failed: {0}")]
    MapInit(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Command sent after the planner event loop has shut down.
    #[error("Planner is no longer running")]
    PlannerClosed,
}

pub type Result<T> = std::result::Result<T, PlannerError>;
