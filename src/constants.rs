//! Stable application-wide constants.
//!
//! Values here are structural invariants, algorithm coefficients, and default
//! fallbacks for env-var-based configuration. They should rarely change.
//! Runtime tuning goes through [`Config`](crate::config::Config) instead;
//! every default below has a matching env override there.

// --- External service defaults (used when env vars are absent) ---

/// Default OSRM base URL. Overridden by `OSRM_BASE_URL`.
pub const DEFAULT_OSRM_BASE_URL: &str = "https://router.project-osrm.org";
/// Default OSRM routing profile. Overridden by `OSRM_PROFILE`.
pub const DEFAULT_OSRM_PROFILE: &str = "driving";
/// Default Nominatim-compatible geocoder base URL. Overridden by
/// `GEOCODER_BASE_URL`.
pub const DEFAULT_GEOCODER_BASE_URL: &str = "https://nominatim.openstreetmap.org";
/// User-Agent sent to the geocoder (Nominatim usage policy requires an
/// identifying agent).
pub const GEOCODER_USER_AGENT: &str = concat!("haulroute/", env!("CARGO_PKG_VERSION"));

// --- Request bounds ---

/// Hard timeout for a single routing-engine request, after which the
/// straight-line fallback runs. Overridden by `ROUTE_REQUEST_TIMEOUT_SECS`.
pub const DEFAULT_ROUTE_REQUEST_TIMEOUT_SECONDS: u64 = 10;
/// Timeout for geocoder requests. Overridden by `GEOCODER_TIMEOUT_SECS`.
pub const DEFAULT_GEOCODER_TIMEOUT_SECONDS: u64 = 10;
/// Maximum waypoints accepted per routing request; longer sequences are
/// rejected by the engine client and degrade to the fallback estimate.
pub const MAX_ROUTE_WAYPOINTS: usize = 25;
/// Minimum waypoints before any route is computed at all.
pub const MIN_ROUTE_WAYPOINTS: usize = 2;
/// Minimum waypoints the optimizer accepts; below this a reorder is
/// meaningless (endpoints are pinned).
pub const MIN_OPTIMIZE_WAYPOINTS: usize = 3;

// --- Rate limiting (rolling window over real routing requests) ---

/// Real routing requests permitted per window. Overridden by
/// `ROUTE_RATE_LIMIT_MAX`. Cache hits and fallback results never count.
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: usize = 5;
/// Rolling window length in seconds. Overridden by
/// `ROUTE_RATE_LIMIT_WINDOW_SECS`.
pub const DEFAULT_RATE_LIMIT_WINDOW_SECONDS: u64 = 60;

// --- Debounce ---

/// Quiet period after the last structural waypoint change before a route
/// recomputation is submitted. Overridden by `SYNC_DEBOUNCE_MS`.
pub const DEFAULT_DEBOUNCE_MS: u64 = 600;

// --- Fallback estimation ---

/// Heuristic pace used when the routing engine is unavailable: minutes of
/// driving per straight-line kilometer. Overridden by
/// `FALLBACK_PACE_MIN_PER_KM`.
pub const DEFAULT_FALLBACK_PACE_MIN_PER_KM: f64 = 3.0;

// --- Fixed precisions ---

/// Decimal places for the coordinate-sequence cache key. Address edits never
/// touch coordinates, so two sequences equal at this precision share a key.
pub const CACHE_KEY_DECIMALS: usize = 6;
/// Decimal places for the reverse-geocode fallback label ("10.7712, 106.6983").
pub const FALLBACK_LABEL_DECIMALS: usize = 4;

// --- In-memory route cache defaults ---

/// Default route cache TTL: 1 hour. Overridden by `ROUTE_CACHE_TTL`.
pub const DEFAULT_ROUTE_CACHE_TTL_SECONDS: u64 = 3_600;
/// Maximum entries for the in-memory route cache (LRU eviction). Overridden
/// by `ROUTE_CACHE_MAX_ENTRIES`.
pub const DEFAULT_ROUTE_CACHE_MAX_ENTRIES: u64 = 512;
