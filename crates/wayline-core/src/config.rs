//! Route-generation configuration.
//!
//! All tuning knobs live here as named defaults. The detour/jitter/curve
//! scalings are heuristic rather than physically derived; downstream
//! distance and duration expectations are calibrated against these exact
//! values, so change them deliberately.

use serde::{Deserialize, Serialize};

/// Distance thresholds that drive route classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceThresholds {
    /// Below this, every generator degenerates to a direct line (meters).
    pub min_route_distance_m: f64,
    /// Below this, routing and metrics use the urban profile (meters).
    pub urban_threshold_m: f64,
    /// Above this, routing and metrics use the highway profile (meters).
    pub highway_threshold_m: f64,
}

impl Default for DistanceThresholds {
    fn default() -> Self {
        Self {
            min_route_distance_m: 50.0,
            urban_threshold_m: 5_000.0,
            highway_threshold_m: 20_000.0,
        }
    }
}

/// Tuning for the smart generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartConfig {
    /// Route length multiplier for suburban routes (1.0 = straight line).
    pub detour_factor: f64,
    /// Interior waypoints per kilometer of straight-line distance.
    pub waypoint_density_per_km: f64,
    /// Detour factor for urban routes.
    pub urban_factor: f64,
    /// Detour factor for highway routes.
    pub highway_factor: f64,
    /// Fraction of the excess length applied as lateral detour.
    pub detour_scale: f64,
    /// Half-width of the first uniform bearing draw (degrees).
    pub bearing_jitter_deg: f64,
    /// Half-width of the second uniform bearing draw (degrees).
    pub curve_jitter_deg: f64,
}

impl Default for SmartConfig {
    fn default() -> Self {
        Self {
            detour_factor: 1.2,
            waypoint_density_per_km: 0.3,
            urban_factor: 1.4,
            highway_factor: 1.1,
            detour_scale: 0.3,
            bearing_jitter_deg: 45.0,
            curve_jitter_deg: 20.0,
        }
    }
}

/// Tuning for the grid generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Average city block size in kilometers.
    pub block_size_km: f64,
    /// Upper bound on generated interior points, keeps long routes cheap.
    pub waypoint_cap: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            block_size_km: 0.5,
            waypoint_cap: 15,
        }
    }
}

/// Tuning for the curved generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurvedConfig {
    /// Length of each curve segment in kilometers.
    pub segment_length_km: f64,
    /// How pronounced the lateral oscillation is (0-1).
    pub curve_intensity: f64,
    /// Random variation applied to the perpendicular bearing (0-1).
    pub variation_factor: f64,
    /// Upper bound on curve segments.
    pub max_segments: usize,
    /// Scale applied to the raw cosine offset.
    pub offset_scale: f64,
}

impl Default for CurvedConfig {
    fn default() -> Self {
        Self {
            segment_length_km: 2.0,
            curve_intensity: 0.5,
            variation_factor: 0.2,
            max_segments: 20,
            offset_scale: 0.1,
        }
    }
}

/// Average speeds and penalties used for duration estimates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedModel {
    pub urban_kmh: f64,
    pub suburban_kmh: f64,
    pub highway_kmh: f64,
    pub rural_kmh: f64,
    /// Global multiplier simulating traffic slowdown.
    pub traffic_multiplier: f64,
    /// Extra seconds charged per interior waypoint.
    pub turn_penalty_s: f64,
}

impl Default for SpeedModel {
    fn default() -> Self {
        Self {
            urban_kmh: 35.0,
            suburban_kmh: 50.0,
            highway_kmh: 80.0,
            rural_kmh: 60.0,
            traffic_multiplier: 0.7,
            turn_penalty_s: 5.0,
        }
    }
}

/// Aggregated routing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub thresholds: DistanceThresholds,
    pub smart: SmartConfig,
    pub grid: GridConfig,
    pub curved: CurvedConfig,
    pub speed: SpeedModel,
}
