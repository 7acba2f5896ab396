//! Server configuration from environment.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_path: String,
    pub database_max_connections: u32,
    /// Preferred backend name; used when the request names no algorithm.
    pub default_backend: Option<String>,
    /// Synthetic algorithm used when no default backend is registered.
    pub fallback_algorithm: String,
    /// Path to an imported road-network JSON file.
    pub graph_path: Option<String>,
    /// Path to a sqlite database exposing road_vertices/road_edges.
    pub road_db_path: Option<String>,
    /// Base URL of an OSRM-compatible remote routing engine.
    pub remote_url: Option<String>,
    pub remote_profile: String,
    pub backend_timeout_s: u64,
    pub max_coordinates: usize,
    pub default_tolerance_m: f64,
    /// Fixed seed for the randomized generators; unset means OS entropy.
    pub route_seed: Option<u64>,
    /// Bearer token widening zone reads to unverified records.
    pub api_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("WAYLINE_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5002),
            database_path: env::var("WAYLINE_DB_PATH")
                .unwrap_or_else(|_| "data/wayline.db".to_string()),
            database_max_connections: env::var("WAYLINE_DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            default_backend: env::var("WAYLINE_DEFAULT_BACKEND").ok().filter(|s| !s.is_empty()),
            fallback_algorithm: env::var("WAYLINE_FALLBACK_ALGORITHM")
                .unwrap_or_else(|_| "smart".to_string()),
            graph_path: env::var("WAYLINE_GRAPH_PATH").ok().filter(|s| !s.is_empty()),
            road_db_path: env::var("WAYLINE_ROAD_DB").ok().filter(|s| !s.is_empty()),
            remote_url: env::var("WAYLINE_REMOTE_URL").ok().filter(|s| !s.is_empty()),
            remote_profile: env::var("WAYLINE_REMOTE_PROFILE")
                .unwrap_or_else(|_| "driving".to_string()),
            backend_timeout_s: env::var("WAYLINE_BACKEND_TIMEOUT_S")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            max_coordinates: env::var("WAYLINE_MAX_COORDINATES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(200),
            default_tolerance_m: env::var("WAYLINE_DEFAULT_TOLERANCE_M")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100.0),
            route_seed: env::var("WAYLINE_ROUTE_SEED").ok().and_then(|s| s.parse().ok()),
            api_token: env::var("WAYLINE_API_TOKEN").ok().filter(|s| !s.is_empty()),
        }
    }
}
