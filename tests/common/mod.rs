use async_trait::async_trait;
use haulroute::cache::MemoryRouteCache;
use haulroute::config::RoutingConfig;
use haulroute::error::{PlannerError, Result};
use haulroute::map::{MapSurface, MarkerSpec};
use haulroute::models::{Coordinates, RoutedPath};
use haulroute::services::geocoding::{GeocodedPlace, Geocoder};
use haulroute::services::optimizer::TripOptimizer;
use haulroute::services::osrm::RoutingEngine;
use haulroute::services::route_service::RouteService;
use haulroute::sync::RoutePlanner;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Debounce used by planner tests. Short so tests stay fast, long enough
/// that several mutations land inside one window.
#[allow(dead_code)]
pub const TEST_DEBOUNCE: Duration = Duration::from_millis(50);

#[allow(dead_code)]
pub fn coords(lat: f64, lng: f64) -> Coordinates {
    Coordinates::new(lat, lng).unwrap()
}

/// Wait long enough for a debounce window plus a mock round trip.
#[allow(dead_code)]
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(250)).await;
}

/// Routing engine double. Echoes the submitted points back as the route
/// path with a fixed 1500m / 3min result, so tests can tell which
/// sequence a result was computed for.
pub struct MockEngine {
    calls: AtomicUsize,
    fail: AtomicBool,
    delays: Mutex<Vec<Duration>>,
}

#[allow(dead_code)]
impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(MockEngine {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            delays: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        let engine = Self::new();
        engine.fail.store(true, Ordering::SeqCst);
        engine
    }

    /// Same delay for every call.
    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Self::with_call_delays(vec![delay])
    }

    /// One delay per call, in submission order; calls past the end of the
    /// list reuse the last entry. Lets a test make an early computation
    /// resolve after a later one.
    pub fn with_call_delays(delays: Vec<Duration>) -> Arc<Self> {
        let engine = Self::new();
        *engine.delays.lock().unwrap() = delays;
        engine
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoutingEngine for MockEngine {
    async fn route(&self, points: &[Coordinates]) -> Result<RoutedPath> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = {
            let delays = self.delays.lock().unwrap();
            delays.get(call).or_else(|| delays.last()).copied()
        };
        if let Some(delay) = delay {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(PlannerError::RoutingApi("mock engine offline".to_string()));
        }

        Ok(RoutedPath {
            distance_meters: 1500.0,
            duration_minutes: 3.0,
            path: points.to_vec(),
            approximate: false,
        })
    }
}

/// Geocoder double. Forward lookups resolve everywhere except queries
/// containing "nowhere"; reverse lookups return a recognizable label.
pub struct MockGeocoder {
    reverse_delay_ms: AtomicU64,
}

#[allow(dead_code)]
impl MockGeocoder {
    pub fn new() -> Arc<Self> {
        Arc::new(MockGeocoder {
            reverse_delay_ms: AtomicU64::new(0),
        })
    }

    pub fn with_reverse_delay(delay: Duration) -> Arc<Self> {
        let geocoder = Self::new();
        geocoder
            .reverse_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
        geocoder
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn forward(&self, query: &str) -> Result<GeocodedPlace> {
        if query.contains("nowhere") {
            return Err(PlannerError::AddressNotFound(query.to_string()));
        }
        Ok(GeocodedPlace {
            coords: coords(10.80, 106.65),
            display_name: format!("{} (geocoded)", query),
        })
    }

    async fn reverse(&self, coords: &Coordinates) -> String {
        let delay = self.reverse_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        format!("Resolved {:.4}, {:.4}", coords.lat, coords.lng)
    }
}

/// Optimizer double: hands back a preconfigured permutation, or fails
/// when none was set.
pub struct MockOptimizer {
    order: Mutex<Option<Vec<usize>>>,
    calls: AtomicUsize,
    delay_ms: AtomicU64,
}

#[allow(dead_code)]
impl MockOptimizer {
    pub fn returning(order: Vec<usize>) -> Arc<Self> {
        Arc::new(MockOptimizer {
            order: Mutex::new(Some(order)),
            calls: AtomicUsize::new(0),
            delay_ms: AtomicU64::new(0),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(MockOptimizer {
            order: Mutex::new(None),
            calls: AtomicUsize::new(0),
            delay_ms: AtomicU64::new(0),
        })
    }

    pub fn with_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TripOptimizer for MockOptimizer {
    async fn optimize(&self, _points: &[Coordinates]) -> Result<Vec<usize>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        match self.order.lock().unwrap().clone() {
            Some(order) => Ok(order),
            None => Err(PlannerError::OptimizationUnavailable(
                "mock optimizer down".to_string(),
            )),
        }
    }
}

/// One rendering call observed by the recording surface.
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum SurfaceCall {
    Markers(Vec<String>),
    Route { points: usize, approximate: bool },
    ClearRoute,
    Focus(Coordinates),
}

/// Surface double that records every rendering call.
pub struct RecordingSurface {
    calls: Arc<Mutex<Vec<SurfaceCall>>>,
}

#[allow(dead_code)]
impl RecordingSurface {
    pub fn new() -> (Box<dyn MapSurface>, Arc<Mutex<Vec<SurfaceCall>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let surface = RecordingSurface {
            calls: calls.clone(),
        };
        (Box::new(surface), calls)
    }
}

impl MapSurface for RecordingSurface {
    fn set_markers(&mut self, markers: &[MarkerSpec]) {
        let labels = markers.iter().map(|m| m.label.clone()).collect();
        self.calls.lock().unwrap().push(SurfaceCall::Markers(labels));
    }

    fn set_route(&mut self, route: &RoutedPath) {
        self.calls.lock().unwrap().push(SurfaceCall::Route {
            points: route.path.len(),
            approximate: route.approximate,
        });
    }

    fn clear_route(&mut self) {
        self.calls.lock().unwrap().push(SurfaceCall::ClearRoute);
    }

    fn focus(&mut self, center: Coordinates) {
        self.calls.lock().unwrap().push(SurfaceCall::Focus(center));
    }
}

/// Planner wired to the given doubles with the test debounce.
#[allow(dead_code)]
pub fn planner_with(
    engine: Arc<MockEngine>,
    geocoder: Arc<MockGeocoder>,
    optimizer: Arc<MockOptimizer>,
    surface: Box<dyn MapSurface>,
) -> RoutePlanner {
    let cache = Arc::new(MemoryRouteCache::new(3600, 100));
    let service = Arc::new(RouteService::new(
        engine,
        cache,
        &RoutingConfig::default(),
    ));
    RoutePlanner::with_parts(service, geocoder, optimizer, surface, TEST_DEBOUNCE)
}

/// Real-API tests run only when explicitly requested.
#[allow(dead_code)]
pub fn should_run_live_api_tests() -> bool {
    std::env::var("LIVE_API_TESTS").is_ok()
}
