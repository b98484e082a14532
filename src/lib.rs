// Library exports for embedding and testing

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod map;
pub mod models;
pub mod services;
pub mod sync;
pub mod waypoints;

// Re-export the types most embedders need
pub use config::Config;
pub use error::{PlannerError, Result};
pub use models::{Coordinates, RoutedPath, Waypoint, WaypointId, WaypointRole};
pub use sync::{PlannerSnapshot, RoutePlanner};
