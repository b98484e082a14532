use crate::constants::*;
use std::env;

/// Routing-side tuning: engine endpoint, resilience policy, cache bounds.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// OSRM base URL, without trailing slash.
    pub base_url: String,
    /// OSRM profile segment, e.g. "driving".
    pub profile: String,
    /// Hard timeout for one routing request (seconds).
    pub request_timeout_secs: u64,
    /// Real requests permitted per rolling window.
    pub rate_limit_max_requests: usize,
    /// Rolling window length (seconds).
    pub rate_limit_window_secs: u64,
    /// Minutes per straight-line kilometer for the fallback estimate.
    pub fallback_pace_min_per_km: f64,
    /// Route cache entry TTL (seconds).
    pub cache_ttl_secs: u64,
    /// Route cache capacity (entries).
    pub cache_max_entries: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        RoutingConfig {
            base_url: DEFAULT_OSRM_BASE_URL.to_string(),
            profile: DEFAULT_OSRM_PROFILE.to_string(),
            request_timeout_secs: DEFAULT_ROUTE_REQUEST_TIMEOUT_SECONDS,
            rate_limit_max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            rate_limit_window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECONDS,
            fallback_pace_min_per_km: DEFAULT_FALLBACK_PACE_MIN_PER_KM,
            cache_ttl_secs: DEFAULT_ROUTE_CACHE_TTL_SECONDS,
            cache_max_entries: DEFAULT_ROUTE_CACHE_MAX_ENTRIES,
        }
    }
}

impl RoutingConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let fallback_pace_min_per_km: f64 = env::var("FALLBACK_PACE_MIN_PER_KM")
            .unwrap_or_else(|_| defaults.fallback_pace_min_per_km.to_string())
            .parse()
            .map_err(|_| "Invalid FALLBACK_PACE_MIN_PER_KM")?;

        if fallback_pace_min_per_km <= 0.0 || !fallback_pace_min_per_km.is_finite() {
            return Err("FALLBACK_PACE_MIN_PER_KM must be a positive number".to_string());
        }

        let rate_limit_max_requests: usize = env::var("ROUTE_RATE_LIMIT_MAX")
            .unwrap_or_else(|_| defaults.rate_limit_max_requests.to_string())
            .parse()
            .map_err(|_| "Invalid ROUTE_RATE_LIMIT_MAX")?;

        if rate_limit_max_requests == 0 {
            return Err("ROUTE_RATE_LIMIT_MAX must be at least 1".to_string());
        }

        Ok(RoutingConfig {
            base_url: env::var("OSRM_BASE_URL").unwrap_or_else(|_| defaults.base_url.clone()),
            profile: env::var("OSRM_PROFILE").unwrap_or_else(|_| defaults.profile.clone()),
            request_timeout_secs: env::var("ROUTE_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| defaults.request_timeout_secs.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_REQUEST_TIMEOUT_SECS")?,
            rate_limit_max_requests,
            rate_limit_window_secs: env::var("ROUTE_RATE_LIMIT_WINDOW_SECS")
                .unwrap_or_else(|_| defaults.rate_limit_window_secs.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_RATE_LIMIT_WINDOW_SECS")?,
            fallback_pace_min_per_km,
            cache_ttl_secs: env::var("ROUTE_CACHE_TTL")
                .unwrap_or_else(|_| defaults.cache_ttl_secs.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_CACHE_TTL")?,
            cache_max_entries: env::var("ROUTE_CACHE_MAX_ENTRIES")
                .unwrap_or_else(|_| defaults.cache_max_entries.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_CACHE_MAX_ENTRIES")?,
        })
    }
}

/// Geocoder endpoint configuration.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    /// Nominatim-compatible base URL, without trailing slash.
    pub base_url: String,
    /// Request timeout (seconds).
    pub request_timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        GeocoderConfig {
            base_url: DEFAULT_GEOCODER_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_GEOCODER_TIMEOUT_SECONDS,
        }
    }
}

impl GeocoderConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        Ok(GeocoderConfig {
            base_url: env::var("GEOCODER_BASE_URL").unwrap_or_else(|_| defaults.base_url.clone()),
            request_timeout_secs: env::var("GEOCODER_TIMEOUT_SECS")
                .unwrap_or_else(|_| defaults.request_timeout_secs.to_string())
                .parse()
                .map_err(|_| "Invalid GEOCODER_TIMEOUT_SECS")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub routing: RoutingConfig,
    pub geocoder: GeocoderConfig,
    /// Quiet period after the last structural change before recomputation
    /// (milliseconds).
    pub debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            routing: RoutingConfig::default(),
            geocoder: GeocoderConfig::default(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        let debounce_ms: u64 = env::var("SYNC_DEBOUNCE_MS")
            .unwrap_or_else(|_| DEFAULT_DEBOUNCE_MS.to_string())
            .parse()
            .map_err(|_| "Invalid SYNC_DEBOUNCE_MS")?;

        if debounce_ms == 0 || debounce_ms > 10_000 {
            return Err("SYNC_DEBOUNCE_MS must be between 1 and 10000".to_string());
        }

        Ok(Config {
            routing: RoutingConfig::from_env()?,
            geocoder: GeocoderConfig::from_env()?,
            debounce_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "OSRM_BASE_URL",
            "OSRM_PROFILE",
            "ROUTE_REQUEST_TIMEOUT_SECS",
            "ROUTE_RATE_LIMIT_MAX",
            "ROUTE_RATE_LIMIT_WINDOW_SECS",
            "FALLBACK_PACE_MIN_PER_KM",
            "ROUTE_CACHE_TTL",
            "ROUTE_CACHE_MAX_ENTRIES",
            "GEOCODER_BASE_URL",
            "GEOCODER_TIMEOUT_SECS",
            "SYNC_DEBOUNCE_MS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_match_constants() {
        clear_env();
        let config = Config::from_env().unwrap();

        assert_eq!(config.routing.base_url, DEFAULT_OSRM_BASE_URL);
        assert_eq!(config.routing.rate_limit_max_requests, 5);
        assert_eq!(config.routing.rate_limit_window_secs, 60);
        assert_eq!(config.routing.fallback_pace_min_per_km, 3.0);
        assert_eq!(config.routing.request_timeout_secs, 10);
        assert_eq!(config.debounce_ms, DEFAULT_DEBOUNCE_MS);
    }

    #[test]
    #[serial]
    fn env_overrides_are_applied() {
        clear_env();
        std::env::set_var("OSRM_BASE_URL", "http://localhost:5000");
        std::env::set_var("ROUTE_RATE_LIMIT_MAX", "2");
        std::env::set_var("SYNC_DEBOUNCE_MS", "250");

        let config = Config::from_env().unwrap();
        assert_eq!(config.routing.base_url, "http://localhost:5000");
        assert_eq!(config.routing.rate_limit_max_requests, 2);
        assert_eq!(config.debounce_ms, 250);

        clear_env();
    }

    #[test]
    #[serial]
    fn rejects_invalid_values() {
        clear_env();
        std::env::set_var("SYNC_DEBOUNCE_MS", "0");
        assert!(Config::from_env().is_err());

        std::env::set_var("SYNC_DEBOUNCE_MS", "600");
        std::env::set_var("ROUTE_RATE_LIMIT_MAX", "0");
        assert!(Config::from_env().is_err());

        std::env::set_var("ROUTE_RATE_LIMIT_MAX", "5");
        std::env::set_var("FALLBACK_PACE_MIN_PER_KM", "-1.0");
        assert!(Config::from_env().is_err());

        clear_env();
    }
}
