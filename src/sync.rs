use crate::cache::MemoryRouteCache;
use crate::config::Config;
use crate::constants::{MAX_ROUTE_WAYPOINTS, MIN_OPTIMIZE_WAYPOINTS, MIN_ROUTE_WAYPOINTS};
use crate::error::{PlannerError, Result};
use crate::map::{markers_for, MapSurface, NullSurface};
use crate::models::{Coordinates, RoutedPath, Waypoint, WaypointId};
use crate::services::geocoding::{Geocoder, NominatimClient};
use crate::services::optimizer::{OsrmTripClient, TripOptimizer};
use crate::services::osrm::OsrmClient;
use crate::services::route_service::RouteService;
use crate::waypoints::WaypointStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// What the host form sees: the current waypoint list and the route
/// computed for it, if any. Republished on every change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlannerSnapshot {
    pub waypoints: Vec<Waypoint>,
    /// `None` until the store holds at least two waypoints and a
    /// computation has completed for the current sequence.
    pub route: Option<RoutedPath>,
}

impl PlannerSnapshot {
    /// Role-annotated marker view of the waypoint list.
    pub fn markers(&self) -> Vec<crate::map::MarkerSpec> {
        markers_for(&self.waypoints)
    }
}

/// Handle to a running route planner.
///
/// Mutations are commands to a background task that owns the waypoint
/// store, the sync state machine and the map surface. Point additions
/// return their id immediately; reverse geocoding, debounced route
/// computation and optimization all complete asynchronously and are
/// observable through [`RoutePlanner::subscribe`].
pub struct RoutePlanner {
    commands: mpsc::UnboundedSender<Command>,
    geocoder: Arc<dyn Geocoder>,
    snapshots: watch::Receiver<PlannerSnapshot>,
    task: JoinHandle<()>,
}

impl RoutePlanner {
    /// Planner with live OSRM and Nominatim clients and no rendering.
    pub fn new(config: &Config) -> Self {
        Self::with_surface(config, Box::new(NullSurface))
    }

    /// Planner rendering to the given surface.
    pub fn with_surface(config: &Config, surface: Box<dyn MapSurface>) -> Self {
        let engine = Arc::new(OsrmClient::new(&config.routing));
        let cache = Arc::new(MemoryRouteCache::new(
            config.routing.cache_ttl_secs,
            config.routing.cache_max_entries,
        ));
        let route_service = Arc::new(RouteService::new(engine, cache, &config.routing));
        let geocoder = Arc::new(NominatimClient::new(&config.geocoder));
        let optimizer = Arc::new(OsrmTripClient::new(&config.routing));

        Self::with_parts(
            route_service,
            geocoder,
            optimizer,
            surface,
            Duration::from_millis(config.debounce_ms),
        )
    }

    /// Planner whose surface comes from a fallible initializer. A factory
    /// error is fatal to the instance and surfaces as `MapInit`; nothing
    /// is spawned in that case.
    pub fn try_with_surface<F>(config: &Config, init_surface: F) -> Result<Self>
    where
        F: FnOnce() -> std::result::Result<Box<dyn MapSurface>, String>,
    {
        let surface = init_surface().map_err(PlannerError::MapInit)?;
        Ok(Self::with_surface(config, surface))
    }

    /// Fully injected constructor, used by tests and embedders with their
    /// own service clients.
    pub fn with_parts(
        route_service: Arc<RouteService>,
        geocoder: Arc<dyn Geocoder>,
        optimizer: Arc<dyn TripOptimizer>,
        surface: Box<dyn MapSurface>,
        debounce: Duration,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(PlannerSnapshot::default());

        let controller = Controller {
            store: WaypointStore::new(),
            state: SyncState::Idle,
            generation: 0,
            route: None,
            debounce,
            route_service,
            geocoder: geocoder.clone(),
            optimizer,
            surface,
            commands: command_rx,
            events: event_rx,
            event_tx,
            snapshot_tx,
        };
        let task = tokio::spawn(controller.run());

        RoutePlanner {
            commands: command_tx,
            geocoder,
            snapshots: snapshot_rx,
            task,
        }
    }

    /// Add a waypoint at clicked coordinates. Returns the new id
    /// immediately; the label starts as "Point N" and is replaced in the
    /// background by a reverse-geocoded address.
    pub fn add_point(&self, coords: Coordinates) -> Result<WaypointId> {
        let waypoint = Waypoint::new(coords, "");
        let id = waypoint.id;
        self.send(Command::AddPoint(waypoint))?;
        Ok(id)
    }

    /// Geocode a free-text address and add the result as a waypoint.
    /// The store is untouched when the address does not resolve.
    pub async fn add_address(&self, query: &str) -> Result<WaypointId> {
        let place = self.geocoder.forward(query).await?;
        let waypoint = Waypoint::new(place.coords, place.display_name);
        let id = waypoint.id;
        self.send(Command::AddWaypoint(waypoint))?;
        Ok(id)
    }

    /// Replace a waypoint's display label. Never triggers recomputation.
    pub fn update_address(&self, id: WaypointId, address: impl Into<String>) -> Result<()> {
        self.send(Command::UpdateAddress(id, address.into()))
    }

    pub fn remove(&self, id: WaypointId) -> Result<()> {
        self.send(Command::Remove(id))
    }

    /// Replace the waypoint order wholesale. Errors unless `order` is a
    /// permutation of the current ids.
    pub async fn reorder(&self, order: Vec<WaypointId>) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Reorder(order, reply_tx))?;
        reply_rx.await.map_err(|_| PlannerError::PlannerClosed)?
    }

    pub fn clear(&self) -> Result<()> {
        self.send(Command::Clear)
    }

    /// Ask the optimizer for a better visiting order and apply it. On any
    /// failure the current order is left untouched.
    pub async fn optimize(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Optimize(reply_tx))?;
        reply_rx.await.map_err(|_| PlannerError::PlannerClosed)?
    }

    /// Watch the waypoint list and route result as they evolve.
    pub fn subscribe(&self) -> watch::Receiver<PlannerSnapshot> {
        self.snapshots.clone()
    }

    /// Stop the planner and release the surface.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown);
        let _ = self.task.await;
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PlannerError::PlannerClosed)
    }
}

enum Command {
    /// Map click: label assigned on arrival, reverse geocoded after.
    AddPoint(Waypoint),
    /// Pre-labeled waypoint from the address path.
    AddWaypoint(Waypoint),
    UpdateAddress(WaypointId, String),
    Remove(WaypointId),
    Reorder(Vec<WaypointId>, oneshot::Sender<Result<()>>),
    Clear,
    Optimize(oneshot::Sender<Result<()>>),
    Shutdown,
}

/// Completions of work spawned by the controller, funneled back into its
/// event loop.
enum Event {
    RouteComputed {
        generation: u64,
        key: String,
        result: Result<RoutedPath>,
    },
    AddressResolved {
        id: WaypointId,
        address: String,
    },
    OptimizeDone {
        ids: Vec<WaypointId>,
        result: Result<Vec<usize>>,
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Sync pipeline state. A structural change arms the debounce deadline;
/// the deadline submits a computation; the computation's completion
/// returns the loop to idle unless it was superseded.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SyncState {
    Idle,
    Debouncing { deadline: Instant },
    Computing { generation: u64 },
}

struct Controller {
    store: WaypointStore,
    state: SyncState,
    /// Counts submitted computations. Completions carrying an older
    /// generation are discarded unseen.
    generation: u64,
    route: Option<RoutedPath>,
    debounce: Duration,
    route_service: Arc<RouteService>,
    geocoder: Arc<dyn Geocoder>,
    optimizer: Arc<dyn TripOptimizer>,
    surface: Box<dyn MapSurface>,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedReceiver<Event>,
    event_tx: mpsc::UnboundedSender<Event>,
    snapshot_tx: watch::Sender<PlannerSnapshot>,
}

impl Controller {
    async fn run(mut self) {
        tracing::debug!("Route planner loop started");
        loop {
            let deadline = match self.state {
                SyncState::Debouncing { deadline } => Some(deadline),
                _ => None,
            };

            tokio::select! {
                maybe_command = self.commands.recv() => {
                    match maybe_command {
                        None | Some(Command::Shutdown) => break,
                        Some(command) => self.handle_command(command),
                    }
                }
                maybe_event = self.events.recv() => {
                    if let Some(event) = maybe_event {
                        self.handle_event(event);
                    }
                }
                _ = sleep_until_opt(deadline) => {
                    self.submit_computation();
                }
            }
        }
        tracing::debug!("Route planner loop stopped");
        // Dropping self releases the surface and its library handles.
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::AddPoint(mut waypoint) => {
                waypoint.address = format!("Point {}", self.store.len() + 1);
                let coords = waypoint.coords;
                let id = waypoint.id;
                if self.insert_waypoint(waypoint) {
                    self.spawn_reverse_geocode(id, coords);
                }
            }
            Command::AddWaypoint(waypoint) => {
                self.insert_waypoint(waypoint);
            }
            Command::UpdateAddress(id, address) => {
                if self.store.update_address(id, address) {
                    self.after_store_change();
                }
            }
            Command::Remove(id) => {
                if self.store.remove(id) {
                    self.after_store_change();
                }
            }
            Command::Reorder(order, reply) => {
                let outcome = match self.store.reorder(&order) {
                    Ok(changed) => {
                        if changed {
                            self.after_store_change();
                        }
                        Ok(())
                    }
                    Err(e) => Err(e),
                };
                let _ = reply.send(outcome);
            }
            Command::Clear => {
                if !self.store.is_empty() {
                    self.store.clear();
                    self.after_store_change();
                }
            }
            Command::Optimize(reply) => self.start_optimize(reply),
            // Intercepted in run(); nothing to do here.
            Command::Shutdown => {}
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::RouteComputed {
                generation,
                key,
                result,
            } => self.apply_route_result(generation, key, result),
            Event::AddressResolved { id, address } => {
                // The waypoint may be gone by now; that is fine.
                if self.store.update_address(id, address) {
                    self.after_store_change();
                }
            }
            Event::OptimizeDone { ids, result, reply } => {
                let outcome = self.apply_optimize_result(ids, result);
                let _ = reply.send(outcome);
            }
        }
    }

    /// Insert a waypoint, focus the surface when it is the first one.
    /// Refuses inserts past the engine's waypoint limit.
    fn insert_waypoint(&mut self, waypoint: Waypoint) -> bool {
        if self.store.len() >= MAX_ROUTE_WAYPOINTS {
            tracing::warn!(
                "Waypoint limit ({}) reached, ignoring add",
                MAX_ROUTE_WAYPOINTS
            );
            return false;
        }

        let first = self.store.is_empty();
        let coords = waypoint.coords;
        if !self.store.insert(waypoint) {
            return false;
        }
        if first {
            self.surface.focus(coords);
        }
        self.after_store_change();
        true
    }

    /// Common tail of every store mutation: re-render markers, and when
    /// the coordinate sequence changed either clear the route (below two
    /// points) or re-arm the debounce deadline.
    fn after_store_change(&mut self) {
        self.surface.set_markers(&markers_for(self.store.waypoints()));

        if self.store.take_dirty() {
            if self.store.len() < MIN_ROUTE_WAYPOINTS {
                self.route = None;
                self.surface.clear_route();
                self.state = SyncState::Idle;
            } else {
                self.state = SyncState::Debouncing {
                    deadline: Instant::now() + self.debounce,
                };
            }
        }

        self.publish();
    }

    /// Debounce deadline fired: submit one computation for the current
    /// sequence.
    fn submit_computation(&mut self) {
        if self.store.len() < MIN_ROUTE_WAYPOINTS {
            self.state = SyncState::Idle;
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        let key = self.store.sequence_key();
        let coords = self.store.coordinates();
        self.state = SyncState::Computing { generation };

        tracing::debug!(
            generation,
            waypoints = coords.len(),
            "Submitting route computation"
        );

        let service = self.route_service.clone();
        let events = self.event_tx.clone();
        tokio::spawn(async move {
            let result = service.compute_route(&coords).await;
            let _ = events.send(Event::RouteComputed {
                generation,
                key,
                result,
            });
        });
    }

    /// Last submitted wins: a completion is applied only if it is the
    /// newest submission and the store still holds the sequence it was
    /// computed for. A superseded sequence has its own deadline armed, so
    /// discarding here never strands the pipeline.
    fn apply_route_result(&mut self, generation: u64, key: String, result: Result<RoutedPath>) {
        if generation != self.generation || key != self.store.sequence_key() {
            tracing::debug!(generation, "Discarding superseded route result");
            return;
        }

        match result {
            Ok(path) => {
                self.surface.set_route(&path);
                self.route = Some(path);
                self.publish();
            }
            Err(e) => {
                tracing::warn!(generation, "Route computation failed: {}", e);
            }
        }

        if self.state == (SyncState::Computing { generation }) {
            self.state = SyncState::Idle;
        }
    }

    fn start_optimize(&mut self, reply: oneshot::Sender<Result<()>>) {
        if self.store.len() < MIN_OPTIMIZE_WAYPOINTS {
            let _ = reply.send(Err(PlannerError::OptimizationUnavailable(format!(
                "Need at least {} waypoints to optimize",
                MIN_OPTIMIZE_WAYPOINTS
            ))));
            return;
        }

        let ids = self.store.ids();
        let coords = self.store.coordinates();
        let optimizer = self.optimizer.clone();
        let events = self.event_tx.clone();
        tokio::spawn(async move {
            let result = optimizer.optimize(&coords).await;
            let _ = events.send(Event::OptimizeDone { ids, result, reply });
        });
    }

    /// Apply an optimizer permutation, unless the waypoint set changed
    /// while the request was in flight. The store is never left half
    /// modified.
    fn apply_optimize_result(
        &mut self,
        ids: Vec<WaypointId>,
        result: Result<Vec<usize>>,
    ) -> Result<()> {
        let order = result?;

        if self.store.ids() != ids {
            return Err(PlannerError::OptimizationUnavailable(
                "Waypoints changed during optimization".to_string(),
            ));
        }

        let changed = self.store.apply_permutation(&order)?;
        if changed {
            tracing::info!(waypoints = ids.len(), "Applied optimized waypoint order");
            self.after_store_change();
        }
        Ok(())
    }

    fn spawn_reverse_geocode(&self, id: WaypointId, coords: Coordinates) {
        let geocoder = self.geocoder.clone();
        let events = self.event_tx.clone();
        tokio::spawn(async move {
            let address = geocoder.reverse(&coords).await;
            let _ = events.send(Event::AddressResolved { id, address });
        });
    }

    fn publish(&self) {
        let _ = self.snapshot_tx.send(PlannerSnapshot {
            waypoints: self.store.waypoints().to_vec(),
            route: self.route.clone(),
        });
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
