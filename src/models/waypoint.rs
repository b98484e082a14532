use crate::models::Coordinates;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of a pickup point, independent of its position in the
/// route order.
pub type WaypointId = Uuid;

/// Position-derived role of a waypoint within the ordered route.
///
/// Roles are never stored; they are recomputed from the current order so
/// that reordering or deleting entries can not leave stale labels behind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WaypointRole {
    Start,
    Pickup,
    End,
}

impl WaypointRole {
    /// Role of the waypoint at `index` in an ordering of `len` entries.
    ///
    /// A single waypoint is a start with no end. With two or more, the
    /// first is the start, the last is the end, everything between is an
    /// intermediate pickup.
    pub fn for_position(index: usize, len: usize) -> Self {
        if index == 0 {
            WaypointRole::Start
        } else if index + 1 == len {
            WaypointRole::End
        } else {
            WaypointRole::Pickup
        }
    }
}

impl fmt::Display for WaypointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaypointRole::Start => write!(f, "start"),
            WaypointRole::Pickup => write!(f, "pickup"),
            WaypointRole::End => write!(f, "end"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Waypoint {
    pub id: WaypointId,
    pub coords: Coordinates,
    /// Display label. Reverse-geocoded for map clicks, user-entered text
    /// for address searches.
    pub address: String,
}

impl Waypoint {
    pub fn new(coords: Coordinates, address: impl Into<String>) -> Self {
        Waypoint {
            id: Uuid::new_v4(),
            coords,
            address: address.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_for_position() {
        // Single entry: start only.
        assert_eq!(WaypointRole::for_position(0, 1), WaypointRole::Start);

        // Pair: start then end, no stops.
        assert_eq!(WaypointRole::for_position(0, 2), WaypointRole::Start);
        assert_eq!(WaypointRole::for_position(1, 2), WaypointRole::End);

        // Longer route: interior entries are pickups.
        assert_eq!(WaypointRole::for_position(0, 4), WaypointRole::Start);
        assert_eq!(WaypointRole::for_position(1, 4), WaypointRole::Pickup);
        assert_eq!(WaypointRole::for_position(2, 4), WaypointRole::Pickup);
        assert_eq!(WaypointRole::for_position(3, 4), WaypointRole::End);
    }

    #[test]
    fn test_waypoints_get_distinct_ids() {
        let coords = Coordinates::new(48.8566, 2.3522).unwrap();
        let a = Waypoint::new(coords, "Rue de Rivoli");
        let b = Waypoint::new(coords, "Rue de Rivoli");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_role_display() {
        assert_eq!(WaypointRole::Start.to_string(), "start");
        assert_eq!(WaypointRole::Pickup.to_string(), "pickup");
        assert_eq!(WaypointRole::End.to_string(), "end");
    }
}
