//! Route metrics derived from a generated point sequence.

use serde::{Deserialize, Serialize};

use crate::config::{DistanceThresholds, SpeedModel};
use crate::geo::{self, Coordinate};

/// Coarse route classification driving speed and duration estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    Urban,
    Suburban,
    Highway,
    Rural,
    Unknown,
}

impl RouteType {
    fn base_speed_kmh(&self, speed: &SpeedModel) -> f64 {
        match self {
            RouteType::Urban => speed.urban_kmh,
            RouteType::Suburban => speed.suburban_kmh,
            RouteType::Highway => speed.highway_kmh,
            RouteType::Rural => speed.rural_kmh,
            RouteType::Unknown => 0.0,
        }
    }
}

/// Summary properties attached to every route feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteProperties {
    pub distance_m: f64,
    pub duration_s: f64,
    pub algorithm: String,
    pub waypoint_count: usize,
    pub estimated_speed_kmh: f64,
    pub route_type: RouteType,
}

impl RouteProperties {
    fn empty(algorithm: &str) -> Self {
        Self {
            distance_m: 0.0,
            duration_s: 0.0,
            algorithm: algorithm.to_string(),
            waypoint_count: 0,
            estimated_speed_kmh: 0.0,
            route_type: RouteType::Unknown,
        }
    }
}

/// Compute distance, duration and classification for a point sequence.
///
/// Sequences with fewer than two points yield a zeroed record with route
/// type `unknown` rather than an error.
pub fn route_properties(
    points: &[Coordinate],
    algorithm: &str,
    thresholds: &DistanceThresholds,
    speed: &SpeedModel,
) -> RouteProperties {
    if points.len() < 2 {
        return RouteProperties::empty(algorithm);
    }

    let total_distance: f64 = points
        .windows(2)
        .map(|w| geo::haversine_distance(w[0], w[1]))
        .sum();

    let route_type = classify(total_distance, points.len(), thresholds);

    let avg_speed_kmh = route_type.base_speed_kmh(speed) * speed.traffic_multiplier;
    let mut duration_s = total_distance / 1000.0 / avg_speed_kmh * 3600.0;

    // Interior waypoints approximate turns and intersections.
    let turn_count = points.len() - 2;
    duration_s += turn_count as f64 * speed.turn_penalty_s;

    RouteProperties {
        distance_m: round1(total_distance),
        duration_s: round1(duration_s),
        algorithm: algorithm.to_string(),
        waypoint_count: points.len(),
        estimated_speed_kmh: round1(avg_speed_kmh),
        route_type,
    }
}

fn classify(distance_m: f64, waypoint_count: usize, thresholds: &DistanceThresholds) -> RouteType {
    if distance_m < thresholds.urban_threshold_m {
        RouteType::Urban
    } else if distance_m > thresholds.highway_threshold_m {
        RouteType::Highway
    } else if waypoint_count > 10 {
        // Many waypoints suggests complex city routing.
        RouteType::Suburban
    } else {
        RouteType::Rural
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
