//! Corridor matching between a route and hazard-zone polygons.
//!
//! The route and every candidate polygon are projected into a local planar
//! XY frame anchored at the route's bounding-box midpoint latitude. A zone
//! crosses the buffered corridor when the projected polygon either contains
//! a route vertex or comes within the buffer tolerance of a route segment.

use crate::geo::{Coordinate, EARTH_RADIUS_M};
use crate::models::{BoundingBox, HazardZone, ImpactResult};

/// Meters per degree of latitude used by the candidate prefilter.
const DEG_TO_METERS_LAT: f64 = 111_000.0;

/// Epsilon in meters for projected intersection arithmetic.
const EPS_M: f64 = 1e-6;

/// Local equirectangular projection anchored at a fixed latitude.
#[derive(Debug, Clone, Copy)]
struct Projection {
    cos_anchor: f64,
}

impl Projection {
    fn new(anchor_lat_deg: f64) -> Self {
        Self {
            cos_anchor: anchor_lat_deg.to_radians().cos(),
        }
    }

    fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        (
            EARTH_RADIUS_M * lon.to_radians() * self.cos_anchor,
            EARTH_RADIUS_M * lat.to_radians(),
        )
    }
}

/// Zones whose polygons intersect the route corridor buffered by
/// `tolerance_m` meters.
///
/// Zones with unusable boundary geometry are skipped, never an error.
pub fn impacted_zones(
    route: &[Coordinate],
    zones: &[HazardZone],
    tolerance_m: f64,
) -> Vec<ImpactResult> {
    let Some(route_bbox) = BoundingBox::from_coordinates(route.iter().copied()) else {
        return Vec::new();
    };
    if route.len() < 2 {
        return Vec::new();
    }

    let anchor_lat = route_bbox.mid_lat();
    let projection = Projection::new(anchor_lat);

    // Prefilter in degree space before paying for projection and
    // segment-pair tests on every zone in the dataset.
    let lat_margin = tolerance_m / DEG_TO_METERS_LAT;
    let lon_margin = tolerance_m / (DEG_TO_METERS_LAT * projection.cos_anchor.max(1e-9));
    let search_bbox = route_bbox.expanded(lat_margin, lon_margin);

    let route_xy: Vec<(f64, f64)> = route
        .iter()
        .map(|p| projection.project(p.lat(), p.lon()))
        .collect();

    let mut impacted = Vec::new();
    for zone in zones {
        let Some(zone_bbox) = zone.boundary_bbox() else {
            continue;
        };
        if !search_bbox.intersects(&zone_bbox) {
            continue;
        }

        let ring_xy: Vec<(f64, f64)> = zone
            .boundary
            .iter()
            .map(|v| projection.project(v[0], v[1]))
            .collect();

        if corridor_intersects_ring(&route_xy, &ring_xy, tolerance_m) {
            impacted.push(ImpactResult {
                id: zone.id.clone(),
                category: zone.category,
                center: zone.center,
                speed_limit: zone.speed_limit,
                intersects: true,
            });
        }
    }

    impacted
}

fn corridor_intersects_ring(route: &[(f64, f64)], ring: &[(f64, f64)], tolerance_m: f64) -> bool {
    // A route vertex inside the polygon means the corridor overlaps it even
    // when no edges come close.
    if route.iter().any(|p| point_in_ring(*p, ring)) {
        return true;
    }

    for segment in route.windows(2) {
        for edge in ring.windows(2) {
            if segment_to_segment_distance(segment[0], segment[1], edge[0], edge[1]) <= tolerance_m
            {
                return true;
            }
        }
    }

    false
}

/// Ray-casting point-in-polygon test on projected coordinates.
fn point_in_ring(point: (f64, f64), ring: &[(f64, f64)]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let (px, py) = point;
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if ((yi > py) != (yj > py)) && (px < (xj - xi) * (py - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Minimum distance between two planar segments in meters.
///
/// Crossing segments (including touches and collinear overlaps) yield zero;
/// otherwise the minimum over the four endpoint-to-segment distances.
fn segment_to_segment_distance(
    a1: (f64, f64),
    a2: (f64, f64),
    b1: (f64, f64),
    b2: (f64, f64),
) -> f64 {
    if segments_intersect(a1, a2, b1, b2) {
        return 0.0;
    }

    point_to_segment_distance(a1, b1, b2)
        .min(point_to_segment_distance(a2, b1, b2))
        .min(point_to_segment_distance(b1, a1, a2))
        .min(point_to_segment_distance(b2, a1, a2))
}

fn segments_intersect(a1: (f64, f64), a2: (f64, f64), b1: (f64, f64), b2: (f64, f64)) -> bool {
    fn orient(p: (f64, f64), q: (f64, f64), r: (f64, f64)) -> f64 {
        (q.0 - p.0) * (r.1 - p.1) - (q.1 - p.1) * (r.0 - p.0)
    }

    fn within(a: f64, b: f64, value: f64) -> bool {
        value >= a.min(b) - EPS_M && value <= a.max(b) + EPS_M
    }

    fn on_segment(p: (f64, f64), q: (f64, f64), r: (f64, f64)) -> bool {
        within(p.0, q.0, r.0) && within(p.1, q.1, r.1)
    }

    let o1 = orient(a1, a2, b1);
    let o2 = orient(a1, a2, b2);
    let o3 = orient(b1, b2, a1);
    let o4 = orient(b1, b2, a2);

    if o1.abs() <= EPS_M && on_segment(a1, a2, b1) {
        return true;
    }
    if o2.abs() <= EPS_M && on_segment(a1, a2, b2) {
        return true;
    }
    if o3.abs() <= EPS_M && on_segment(b1, b2, a1) {
        return true;
    }
    if o4.abs() <= EPS_M && on_segment(b1, b2, a2) {
        return true;
    }

    let a_crosses = (o1 > EPS_M && o2 < -EPS_M) || (o1 < -EPS_M && o2 > EPS_M);
    let b_crosses = (o3 > EPS_M && o4 < -EPS_M) || (o3 < -EPS_M && o4 > EPS_M);
    a_crosses && b_crosses
}

fn point_to_segment_distance(point: (f64, f64), seg_a: (f64, f64), seg_b: (f64, f64)) -> f64 {
    let (px, py) = (point.0 - seg_a.0, point.1 - seg_a.1);
    let (sx, sy) = (seg_b.0 - seg_a.0, seg_b.1 - seg_a.1);

    let seg_len_sq = sx * sx + sy * sy;
    if seg_len_sq < EPS_M {
        return (px * px + py * py).sqrt();
    }

    let t = ((px * sx + py * sy) / seg_len_sq).clamp(0.0, 1.0);
    let dx = px - t * sx;
    let dy = py - t * sy;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo;
    use crate::models::ZoneCategory;
    use chrono::Utc;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    /// Square zone of the given half-size (degrees) around a center.
    fn square_zone(id: &str, center: Coordinate, half_deg: f64) -> HazardZone {
        let (lat, lon) = (center.lat(), center.lon());
        HazardZone {
            id: id.to_string(),
            category: ZoneCategory::FixedSpeedCamera,
            boundary: vec![
                [lat - half_deg, lon - half_deg],
                [lat - half_deg, lon + half_deg],
                [lat + half_deg, lon + half_deg],
                [lat + half_deg, lon - half_deg],
                [lat - half_deg, lon - half_deg],
            ],
            center,
            speed_limit: Some(60),
            verified: true,
            active: true,
            updated_at: Utc::now(),
        }
    }

    fn tashkent_route() -> Vec<Coordinate> {
        vec![coord(41.2995, 69.2401), coord(41.3158, 69.2785)]
    }

    #[test]
    fn zone_on_route_midpoint_intersects() {
        let route = tashkent_route();
        let midpoint = geo::interpolate(route[0], route[1], 0.5);
        // ~220 m half-size.
        let zone = square_zone("mid", midpoint, 0.002);

        let hits = impacted_zones(&route, &[zone], 50.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "mid");
        assert!(hits[0].intersects);
    }

    #[test]
    fn far_zone_does_not_intersect() {
        let route = tashkent_route();
        let tolerance = 100.0;
        // Center ~25 km north of the route, far beyond 10x the tolerance.
        let zone = square_zone("far", coord(41.53, 69.26), 0.002);

        assert!(impacted_zones(&route, &[zone], tolerance).is_empty());
    }

    #[test]
    fn crossing_edge_intersects_without_contained_vertices() {
        // Thin tall rectangle crossing the route like an X: no route vertex
        // inside, no polygon vertex near a route vertex, edges still cross.
        let route = tashkent_route();
        let midpoint = geo::interpolate(route[0], route[1], 0.5);
        let (lat, lon) = (midpoint.lat(), midpoint.lon());
        let zone = HazardZone {
            boundary: vec![
                [lat - 0.01, lon - 0.0002],
                [lat - 0.01, lon + 0.0002],
                [lat + 0.01, lon + 0.0002],
                [lat + 0.01, lon - 0.0002],
                [lat - 0.01, lon - 0.0002],
            ],
            ..square_zone("cross", midpoint, 0.002)
        };

        let hits = impacted_zones(&route, &[zone], 0.0);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn route_inside_large_zone_intersects() {
        let route = tashkent_route();
        let midpoint = geo::interpolate(route[0], route[1], 0.5);
        // Half a degree in every direction, the whole route is inside.
        let zone = square_zone("big", midpoint, 0.5);

        assert_eq!(impacted_zones(&route, &[zone], 10.0).len(), 1);
    }

    #[test]
    fn tolerance_widens_the_corridor() {
        let route = tashkent_route();
        let midpoint = geo::interpolate(route[0], route[1], 0.5);
        // Small zone ~550 m north of the route line.
        let offset_center = coord(midpoint.lat() + 0.005, midpoint.lon());
        let zone = square_zone("offset", offset_center, 0.001);

        assert!(impacted_zones(&route, std::slice::from_ref(&zone), 50.0).is_empty());
        assert_eq!(impacted_zones(&route, &[zone], 600.0).len(), 1);
    }

    #[test]
    fn malformed_boundary_is_skipped() {
        let route = tashkent_route();
        let midpoint = geo::interpolate(route[0], route[1], 0.5);

        let mut broken = square_zone("broken", midpoint, 0.002);
        broken.boundary.truncate(2);
        let good = square_zone("good", midpoint, 0.002);

        let hits = impacted_zones(&route, &[broken, good], 50.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "good");
    }
}
