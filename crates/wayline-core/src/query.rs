//! Nearest-zone ranking and versioned delta queries.
//!
//! Both operate on request-scoped slices of zones fetched from the external
//! store; scope filters such as active/verified are applied by the caller.

use crate::geo::{self, Coordinate};
use crate::models::{BoundingBox, HazardZone, NearbyZone, VersionToken};

/// Meters per degree of latitude for the prefilter box.
const DEG_TO_METERS_LAT: f64 = 111_000.0;

/// Result of a versioned delta query.
#[derive(Debug, Clone)]
pub struct DeltaResult {
    pub new_token: VersionToken,
    pub records: Vec<HazardZone>,
}

/// Rank zones by distance from `origin`, closest first.
///
/// When `max_distance_m` is given, candidates are prefiltered with a
/// bounding box before the exact haversine pass, and anything farther than
/// the limit is dropped. The result is truncated to `limit` entries.
pub fn nearest_zones(
    zones: &[HazardZone],
    origin: Coordinate,
    max_distance_m: Option<f64>,
    limit: usize,
) -> Vec<NearbyZone> {
    let prefilter = max_distance_m.map(|radius| {
        let lat_margin = radius / DEG_TO_METERS_LAT;
        let lon_margin = radius / (DEG_TO_METERS_LAT * origin.lat().to_radians().cos().max(1e-9));
        BoundingBox {
            min_lat: origin.lat(),
            max_lat: origin.lat(),
            min_lon: origin.lon(),
            max_lon: origin.lon(),
        }
        .expanded(lat_margin, lon_margin)
    });

    let mut ranked: Vec<NearbyZone> = zones
        .iter()
        .filter(|zone| match &prefilter {
            Some(bbox) => bbox.contains(zone.center.lat(), zone.center.lon()),
            None => true,
        })
        .map(|zone| NearbyZone {
            id: zone.id.clone(),
            category: zone.category,
            center: zone.center,
            speed_limit: zone.speed_limit,
            distance_m: geo::haversine_distance(origin, zone.center),
        })
        .filter(|nearby| match max_distance_m {
            Some(radius) => nearby.distance_m <= radius,
            None => true,
        })
        .collect();

    ranked.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    ranked.truncate(limit);
    ranked
}

/// Versioned "changed since" query over the zones in scope.
///
/// Scope is optionally bounded to a radius around a point. The returned
/// token is the latest `updated_at` in scope; replaying it with no
/// intervening updates yields zero records. An empty scope echoes the
/// incoming token so the caller's cursor never goes backwards.
pub fn delta_sync(
    zones: &[HazardZone],
    scope: Option<(Coordinate, f64)>,
    token: VersionToken,
) -> DeltaResult {
    let in_scope: Vec<&HazardZone> = zones
        .iter()
        .filter(|zone| match scope {
            Some((origin, radius_m)) => {
                geo::haversine_distance(origin, zone.center) <= radius_m
            }
            None => true,
        })
        .collect();

    let latest = in_scope.iter().map(|zone| zone.updated_at).max();
    let new_token = match latest {
        Some(ts) => VersionToken::Since(ts),
        None => token,
    };

    let records = in_scope
        .into_iter()
        .filter(|zone| match token {
            VersionToken::Full => true,
            VersionToken::Since(since) => zone.updated_at > since,
        })
        .cloned()
        .collect();

    DeltaResult { new_token, records }
}
