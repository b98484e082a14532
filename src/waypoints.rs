use crate::cache::route_cache_key;
use crate::error::{PlannerError, Result};
use crate::models::{Coordinates, Waypoint, WaypointId};
use std::collections::{HashMap, HashSet};

/// Ordered collection of pickup points under construction.
///
/// The store is the single source of truth for route order. It tracks a
/// dirty flag for the route pipeline: set whenever the coordinate sequence
/// changes by value, never for address-only edits, never for mutations
/// that leave the sequence as it was (removing an unknown id, reordering
/// into the existing order). The controller drains it with `take_dirty`.
#[derive(Debug, Default)]
pub struct WaypointStore {
    waypoints: Vec<Waypoint>,
    dirty: bool,
}

impl WaypointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new waypoint and return its generated id.
    pub fn add(&mut self, coords: Coordinates, provisional_address: impl Into<String>) -> WaypointId {
        let waypoint = Waypoint::new(coords, provisional_address);
        let id = waypoint.id;
        self.waypoints.push(waypoint);
        self.dirty = true;
        id
    }

    /// Append a waypoint whose id was generated by the caller.
    /// Returns false (and leaves the store untouched) if the id is taken.
    pub fn insert(&mut self, waypoint: Waypoint) -> bool {
        if self.waypoints.iter().any(|w| w.id == waypoint.id) {
            return false;
        }
        self.waypoints.push(waypoint);
        self.dirty = true;
        true
    }

    /// Replace the address label only. Ordering and route state are
    /// unaffected; this never marks the sequence dirty.
    pub fn update_address(&mut self, id: WaypointId, address: impl Into<String>) -> bool {
        match self.waypoints.iter_mut().find(|w| w.id == id) {
            Some(waypoint) => {
                waypoint.address = address.into();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: WaypointId) -> bool {
        let before = self.waypoints.len();
        self.waypoints.retain(|w| w.id != id);
        if self.waypoints.len() != before {
            self.dirty = true;
            true
        } else {
            false
        }
    }

    /// Replace the order wholesale. `new_order` must be a permutation of
    /// the current ids. Returns false without marking dirty when the
    /// proposed order is the one already held.
    pub fn reorder(&mut self, new_order: &[WaypointId]) -> Result<bool> {
        if new_order.len() != self.waypoints.len() {
            return Err(PlannerError::InvalidRequest(
                "Reorder must mention every waypoint exactly once".to_string(),
            ));
        }

        let current: HashSet<WaypointId> = self.waypoints.iter().map(|w| w.id).collect();
        let proposed: HashSet<WaypointId> = new_order.iter().copied().collect();
        if proposed.len() != new_order.len() || proposed != current {
            return Err(PlannerError::InvalidRequest(
                "Reorder ids do not match the current waypoints".to_string(),
            ));
        }

        let unchanged = self
            .waypoints
            .iter()
            .map(|w| w.id)
            .eq(new_order.iter().copied());
        if unchanged {
            return Ok(false);
        }

        let coords_before = self.coordinates();
        let mut by_id: HashMap<WaypointId, Waypoint> =
            self.waypoints.drain(..).map(|w| (w.id, w)).collect();
        for id in new_order {
            if let Some(waypoint) = by_id.remove(id) {
                self.waypoints.push(waypoint);
            }
        }

        // Two points can share coordinates; swapping them changes labels
        // but not the route.
        if self.coordinates() != coords_before {
            self.dirty = true;
        }
        Ok(true)
    }

    /// Index-based reorder used to apply optimizer output: element `k` of
    /// `order` is the current index of the waypoint to place at `k`.
    pub fn apply_permutation(&mut self, order: &[usize]) -> Result<bool> {
        if order.len() != self.waypoints.len() {
            return Err(PlannerError::InvalidRequest(
                "Permutation length does not match the store".to_string(),
            ));
        }

        let mut seen = vec![false; order.len()];
        for &index in order {
            if index >= order.len() || seen[index] {
                return Err(PlannerError::InvalidRequest(
                    "Not a permutation of waypoint positions".to_string(),
                ));
            }
            seen[index] = true;
        }

        if order.iter().enumerate().all(|(position, &index)| position == index) {
            return Ok(false);
        }

        let coords_before = self.coordinates();
        let mut drained: Vec<Option<Waypoint>> = self.waypoints.drain(..).map(Some).collect();
        self.waypoints = order
            .iter()
            .filter_map(|&index| drained[index].take())
            .collect();

        if self.coordinates() != coords_before {
            self.dirty = true;
        }
        Ok(true)
    }

    pub fn clear(&mut self) {
        if !self.waypoints.is_empty() {
            self.waypoints.clear();
            self.dirty = true;
        }
    }

    /// Consume the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn get(&self, id: WaypointId) -> Option<&Waypoint> {
        self.waypoints.iter().find(|w| w.id == id)
    }

    pub fn ids(&self) -> Vec<WaypointId> {
        self.waypoints.iter().map(|w| w.id).collect()
    }

    pub fn coordinates(&self) -> Vec<Coordinates> {
        self.waypoints.iter().map(|w| w.coords).collect()
    }

    /// Canonical key of the current coordinate sequence. Address edits do
    /// not change it.
    pub fn sequence_key(&self) -> String {
        route_cache_key(&self.coordinates())
    }
}
