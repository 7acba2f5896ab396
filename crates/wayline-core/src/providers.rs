//! Route generation strategies.
//!
//! Every provider honors the same contract: at least two points, with the
//! first and last exactly equal to the requested start and end. Interior
//! points are free to approximate roads, curves or grids, but the endpoints
//! are never moved.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::config::{CurvedConfig, DistanceThresholds, GridConfig, SmartConfig};
use crate::geo::{self, Coordinate, CoordinateError};

/// Failure modes shared by synthetic generators and data-backed providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("generated geometry is invalid: {0}")]
    Geometry(#[from] CoordinateError),
    #[error("could not snap {0} to the road network")]
    SnapMiss(&'static str),
    #[error("no path between the snapped endpoints")]
    NoPath,
    #[error("provider returned empty geometry")]
    EmptyGeometry,
    #[error("backend request failed: {0}")]
    Backend(String),
    #[error("backend timed out")]
    Timeout,
}

/// A route computation strategy, selected by name through the registry.
pub trait RouteProvider: Send + Sync {
    fn generate(&self, start: Coordinate, end: Coordinate)
        -> Result<Vec<Coordinate>, ProviderError>;
}

/// Straight line between the two points. Baseline and universal fallback.
#[derive(Debug, Default)]
pub struct DirectRoute;

impl RouteProvider for DirectRoute {
    fn generate(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<Vec<Coordinate>, ProviderError> {
        Ok(vec![start, end])
    }
}

/// Distance-aware generator with randomized detours.
///
/// Classifies the request as urban, suburban or highway by straight-line
/// distance, then scatters interior waypoints around the direct line with
/// a sine-shaped lateral offset and jittered bearings.
#[derive(Debug)]
pub struct SmartRoute {
    config: SmartConfig,
    thresholds: DistanceThresholds,
    seed: Option<u64>,
}

impl SmartRoute {
    pub fn new(config: SmartConfig, thresholds: DistanceThresholds, seed: Option<u64>) -> Self {
        Self {
            config,
            thresholds,
            seed,
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    fn curved_waypoints(
        &self,
        start: Coordinate,
        end: Coordinate,
        count: usize,
        detour_factor: f64,
    ) -> Result<Vec<Coordinate>, ProviderError> {
        if count <= 2 {
            return Ok(vec![start, end]);
        }

        let mut rng = self.rng();
        let base_bearing = geo::initial_bearing(start, end);
        let total_distance = geo::haversine_distance(start, end);
        let jitter = self.config.bearing_jitter_deg;
        let curve_jitter = self.config.curve_jitter_deg;

        let mut waypoints = Vec::with_capacity(count);
        waypoints.push(start);

        for i in 1..count - 1 {
            let progress = i as f64 / (count - 1) as f64;
            let base_point = geo::interpolate(start, end, progress);

            let detour_distance = total_distance * (detour_factor - 1.0) * self.config.detour_scale;
            let detour_bearing = base_bearing + rng.random_range(-jitter..jitter);

            // Sine envelope keeps the detour zero at both endpoints.
            let curve_offset = (progress * std::f64::consts::PI).sin() * detour_distance;
            let final_bearing = detour_bearing + rng.random_range(-curve_jitter..curve_jitter);

            waypoints.push(geo::destination_point(base_point, curve_offset, final_bearing));
        }

        waypoints.push(end);
        Ok(waypoints)
    }
}

impl RouteProvider for SmartRoute {
    fn generate(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<Vec<Coordinate>, ProviderError> {
        let distance = geo::haversine_distance(start, end);
        if distance < self.thresholds.min_route_distance_m {
            return Ok(vec![start, end]);
        }

        let distance_km = distance / 1000.0;
        let density = self.config.waypoint_density_per_km;

        let (count, detour_factor) = if distance < self.thresholds.urban_threshold_m {
            let count = ((distance_km * density * 3.0).floor() as usize).max(3);
            (count, self.config.urban_factor)
        } else if distance > self.thresholds.highway_threshold_m {
            let count = ((distance_km * density * 0.5).floor() as usize).max(2);
            (count, self.config.highway_factor)
        } else {
            let count = ((distance_km * density).floor() as usize).max(2);
            (count, self.config.detour_factor)
        };

        self.curved_waypoints(start, end, count, detour_factor)
    }
}

/// Axis-aligned staircase path approximating a street grid.
#[derive(Debug)]
pub struct GridRoute {
    config: GridConfig,
    thresholds: DistanceThresholds,
}

impl GridRoute {
    pub fn new(config: GridConfig, thresholds: DistanceThresholds) -> Self {
        Self { config, thresholds }
    }
}

impl RouteProvider for GridRoute {
    fn generate(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<Vec<Coordinate>, ProviderError> {
        let distance = geo::haversine_distance(start, end);
        if distance < self.thresholds.min_route_distance_m {
            return Ok(vec![start, end]);
        }

        let block_size_m = self.config.block_size_km * 1000.0;
        let lat_diff = end.lat() - start.lat();
        let lon_diff = end.lon() - start.lon();

        // Rough degree conversion; longitude shrinks with latitude.
        let blocks_lat = lat_diff.abs() / (block_size_m / 111_000.0);
        let blocks_lon =
            lon_diff.abs() / (block_size_m / (111_000.0 * start.lat().to_radians().cos()));

        let total_blocks = (blocks_lat + blocks_lon).floor();
        if !total_blocks.is_finite() || total_blocks <= 2.0 {
            return Ok(vec![start, end]);
        }
        let total_blocks = total_blocks as usize;

        let mut waypoints = vec![start];
        let mut current = start;

        for i in 1..total_blocks.min(self.config.waypoint_cap) {
            let progress = i as f64 / total_blocks as f64;

            // Alternate lon/lat moves to produce right-angle turns.
            current = if i % 2 == 1 {
                Coordinate::new(current.lat(), start.lon() + lon_diff * progress)?
            } else {
                Coordinate::new(start.lat() + lat_diff * progress, current.lon())?
            };
            waypoints.push(current);
        }

        waypoints.push(end);
        Ok(waypoints)
    }
}

/// Gently oscillating path for highway and rural routing.
#[derive(Debug)]
pub struct CurvedRoute {
    config: CurvedConfig,
    seed: Option<u64>,
}

impl CurvedRoute {
    pub fn new(config: CurvedConfig, seed: Option<u64>) -> Self {
        Self { config, seed }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

impl RouteProvider for CurvedRoute {
    fn generate(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<Vec<Coordinate>, ProviderError> {
        let segment_length_m = self.config.segment_length_km * 1000.0;
        let distance = geo::haversine_distance(start, end);

        if distance < segment_length_m {
            return Ok(vec![start, end]);
        }

        let num_segments = ((distance / segment_length_m) as usize).min(self.config.max_segments);
        if num_segments <= 1 {
            return Ok(vec![start, end]);
        }

        let mut rng = self.rng();
        let base_bearing = geo::initial_bearing(start, end);

        let mut waypoints = vec![start];
        for i in 1..num_segments {
            let progress = i as f64 / num_segments as f64;
            let base_point = geo::interpolate(start, end, progress);

            let curve_offset = (progress * std::f64::consts::TAU).cos()
                * distance
                * self.config.curve_intensity
                * self.config.offset_scale;

            // Offset perpendicular to the direction of travel.
            let bearing_variation = self.config.variation_factor * rng.random_range(-30.0..30.0);
            let curve_bearing = base_bearing + 90.0 + bearing_variation;

            waypoints.push(geo::destination_point(
                base_point,
                curve_offset.abs(),
                curve_bearing,
            ));
        }

        waypoints.push(end);
        Ok(waypoints)
    }
}
