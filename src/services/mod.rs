pub mod geocoding;
pub mod optimizer;
pub mod osrm;
pub mod rate_limit;
pub mod route_service;
