//! Hazard-zone data models and shared geometry helpers.
//!
//! Zone records are owned by an external store; this crate only ever reads
//! them. The matcher and query modules consume request-scoped slices of
//! [`HazardZone`] and never mutate them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Closure tolerance for polygon rings, in degrees.
const RING_CLOSURE_EPSILON: f64 = 1e-4;

/// Category of a registered hazard zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneCategory {
    FixedSpeedCamera,
    MobileTripod,
    RedLight,
    AverageSpeed,
    SectionControl,
    BusLane,
    Other,
}

impl ZoneCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneCategory::FixedSpeedCamera => "fixed_speed_camera",
            ZoneCategory::MobileTripod => "mobile_tripod",
            ZoneCategory::RedLight => "red_light",
            ZoneCategory::AverageSpeed => "average_speed",
            ZoneCategory::SectionControl => "section_control",
            ZoneCategory::BusLane => "bus_lane",
            ZoneCategory::Other => "other",
        }
    }

    /// Parse a stored category label; unknown labels map to `Other`.
    pub fn parse(label: &str) -> Self {
        match label {
            "fixed_speed_camera" => ZoneCategory::FixedSpeedCamera,
            "mobile_tripod" => ZoneCategory::MobileTripod,
            "red_light" => ZoneCategory::RedLight,
            "average_speed" => ZoneCategory::AverageSpeed,
            "section_control" => ZoneCategory::SectionControl,
            "bus_lane" => ZoneCategory::BusLane,
            _ => ZoneCategory::Other,
        }
    }
}

/// A registered hazard zone, read-only to the routing engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardZone {
    pub id: String,
    pub category: ZoneCategory,
    /// Boundary polygon vertices as `[lat, lon]` pairs (closed ring,
    /// first == last).
    pub boundary: Vec<[f64; 2]>,
    pub center: Coordinate,
    /// Posted speed limit in km/h, when known.
    pub speed_limit: Option<u32>,
    pub verified: bool,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

impl HazardZone {
    /// Whether the boundary is a usable closed ring.
    ///
    /// Zones failing this check are skipped by the matcher rather than
    /// reported as errors.
    pub fn boundary_is_valid(&self) -> bool {
        if self.boundary.len() < 4 {
            return false;
        }
        if self
            .boundary
            .iter()
            .any(|v| !v[0].is_finite() || !v[1].is_finite())
        {
            return false;
        }
        let first = self.boundary[0];
        let last = self.boundary[self.boundary.len() - 1];
        (first[0] - last[0]).abs() <= RING_CLOSURE_EPSILON
            && (first[1] - last[1]).abs() <= RING_CLOSURE_EPSILON
    }

    /// Bounding box of the boundary ring, `None` when the ring is unusable.
    pub fn boundary_bbox(&self) -> Option<BoundingBox> {
        if !self.boundary_is_valid() {
            return None;
        }
        BoundingBox::from_lat_lon_pairs(self.boundary.iter().copied())
    }
}

/// A zone reported as crossing the buffered route corridor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactResult {
    pub id: String,
    pub category: ZoneCategory,
    pub center: Coordinate,
    pub speed_limit: Option<u32>,
    pub intersects: bool,
}

/// A zone ranked by distance from a query point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyZone {
    pub id: String,
    pub category: ZoneCategory,
    pub center: Coordinate,
    pub speed_limit: Option<u32>,
    pub distance_m: f64,
}

/// Opaque change cursor for delta queries.
///
/// Encoded as a string: `"0"` (or an absent parameter) requests a full
/// resync, anything else is the RFC3339 timestamp of the last sync.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VersionToken {
    Full,
    Since(DateTime<Utc>),
}

impl VersionToken {
    pub const FULL_RESYNC: &'static str = "0";

    pub fn parse(raw: Option<&str>) -> Result<Self, String> {
        match raw {
            None | Some(Self::FULL_RESYNC) | Some("") => Ok(VersionToken::Full),
            Some(value) => DateTime::parse_from_rfc3339(value)
                .map(|ts| VersionToken::Since(ts.with_timezone(&Utc)))
                .map_err(|_| format!("invalid version token: {value}")),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            VersionToken::Full => Self::FULL_RESYNC.to_string(),
            // Z suffix keeps the token free of '+', which URL query
            // decoding would otherwise turn into a space.
            VersionToken::Since(ts) => {
                ts.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
            }
        }
    }
}

/// Axis-aligned lat/lon bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn from_coordinates<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        Self::from_lat_lon_pairs(points.into_iter().map(|p| [p.lat(), p.lon()]))
    }

    pub fn from_lat_lon_pairs<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = [f64; 2]>,
    {
        let mut bbox: Option<BoundingBox> = None;
        for [lat, lon] in points {
            if !lat.is_finite() || !lon.is_finite() {
                continue;
            }
            bbox = Some(match bbox {
                None => BoundingBox {
                    min_lat: lat,
                    max_lat: lat,
                    min_lon: lon,
                    max_lon: lon,
                },
                Some(b) => BoundingBox {
                    min_lat: b.min_lat.min(lat),
                    max_lat: b.max_lat.max(lat),
                    min_lon: b.min_lon.min(lon),
                    max_lon: b.max_lon.max(lon),
                },
            });
        }
        bbox
    }

    /// Expand symmetrically by the given margins in degrees.
    pub fn expanded(&self, lat_margin: f64, lon_margin: f64) -> Self {
        Self {
            min_lat: self.min_lat - lat_margin,
            max_lat: self.max_lat + lat_margin,
            min_lon: self.min_lon - lon_margin,
            max_lon: self.max_lon + lon_margin,
        }
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
            && self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// Midpoint latitude, used as the anchor for planar projection.
    pub fn mid_lat(&self) -> f64 {
        (self.min_lat + self.max_lat) / 2.0
    }
}
