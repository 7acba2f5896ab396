//! GeoJSON assembly for computed routes.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::metrics::RouteProperties;

/// GeoJSON `Feature` carrying a route line and its metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteFeature {
    #[serde(rename = "type")]
    pub feature_type: String,
    pub properties: RouteProperties,
    pub geometry: LineStringGeometry,
}

/// GeoJSON `LineString` geometry with `[lon, lat]` coordinate order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineStringGeometry {
    #[serde(rename = "type")]
    pub geometry_type: String,
    pub coordinates: Vec<[f64; 2]>,
}

impl RouteFeature {
    /// Build a line feature, downsampling when the point count exceeds
    /// `max_coordinates`.
    ///
    /// Downsampling keeps every `stride`-th point and always pins the final
    /// coordinate to the true route endpoint, so the output never exceeds
    /// the cap and never drops the destination.
    pub fn line(
        points: &[Coordinate],
        properties: RouteProperties,
        max_coordinates: usize,
    ) -> Self {
        let coordinates = downsample(points, max_coordinates);
        Self {
            feature_type: "Feature".to_string(),
            properties,
            geometry: LineStringGeometry {
                geometry_type: "LineString".to_string(),
                coordinates,
            },
        }
    }
}

fn downsample(points: &[Coordinate], max_coordinates: usize) -> Vec<[f64; 2]> {
    let Some(last) = points.last() else {
        return Vec::new();
    };

    if max_coordinates < 2 || points.len() <= max_coordinates {
        return points.iter().map(Coordinate::to_lon_lat).collect();
    }

    let stride = points.len().div_ceil(max_coordinates);
    let mut coordinates: Vec<[f64; 2]> = points
        .iter()
        .step_by(stride)
        .map(Coordinate::to_lon_lat)
        .collect();

    let endpoint = last.to_lon_lat();
    if coordinates.last() != Some(&endpoint) {
        if coordinates.len() == max_coordinates {
            let last_idx = coordinates.len() - 1;
            coordinates[last_idx] = endpoint;
        } else {
            coordinates.push(endpoint);
        }
    }

    coordinates
}
