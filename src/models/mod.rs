pub mod coordinates;
pub mod route;
pub mod waypoint;

pub use coordinates::Coordinates;
pub use route::RoutedPath;
pub use waypoint::{Waypoint, WaypointId, WaypointRole};
