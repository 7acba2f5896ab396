//! Geodesic math primitives on a spherical Earth.
//!
//! Everything in this module is pure and bit-reproducible: the same inputs
//! always produce the same outputs, which the route generators rely on for
//! seeded determinism.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Earth radius used for all distance calculations (meters).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("invalid latitude {0}: must be within [-90, 90]")]
    Latitude(f64),
    #[error("invalid longitude {0}: must be within [-180, 180]")]
    Longitude(f64),
}

/// A validated GPS coordinate.
///
/// Construction goes through [`Coordinate::new`], so a `Coordinate` always
/// holds an in-range latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoordinateParts", into = "CoordinateParts")]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

/// Raw serde representation of a coordinate, validated on the way in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct CoordinateParts {
    lat: f64,
    lon: f64,
}

impl TryFrom<CoordinateParts> for Coordinate {
    type Error = CoordinateError;

    fn try_from(parts: CoordinateParts) -> Result<Self, CoordinateError> {
        Coordinate::new(parts.lat, parts.lon)
    }
}

impl From<Coordinate> for CoordinateParts {
    fn from(coord: Coordinate) -> Self {
        Self {
            lat: coord.lat,
            lon: coord.lon,
        }
    }
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::Latitude(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::Longitude(lon));
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// `[lon, lat]` pair as used by GeoJSON geometry.
    pub fn to_lon_lat(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

/// Great-circle distance between two points in meters (Haversine formula).
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Initial bearing from `a` to `b` in degrees, normalized to [0, 360).
pub fn initial_bearing(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dlambda = (b.lon - a.lon).to_radians();

    let y = dlambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();

    y.atan2(x).to_degrees().rem_euclid(360.0)
}

/// Destination point reached by travelling `distance_m` meters from `origin`
/// along the given initial bearing (forward geodesic on a sphere).
pub fn destination_point(origin: Coordinate, distance_m: f64, bearing_deg: f64) -> Coordinate {
    if distance_m.abs() <= f64::EPSILON {
        return origin;
    }

    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();
    let bearing = bearing_deg.to_radians();
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2.clamp(-1.0, 1.0);
    let mut lon2 = lon1 + y.atan2(x);
    lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    Coordinate {
        lat: lat2.to_degrees(),
        lon: lon2.to_degrees(),
    }
}

/// Linear interpolation between two coordinates in lat/lon space.
///
/// Not a geodesic slerp. At the short and medium distances routed here the
/// error is negligible and linearity keeps the generators cheap.
pub fn interpolate(a: Coordinate, b: Coordinate, fraction: f64) -> Coordinate {
    Coordinate {
        lat: a.lat + (b.lat - a.lat) * fraction,
        lon: a.lon + (b.lon - a.lon) * fraction,
    }
}
