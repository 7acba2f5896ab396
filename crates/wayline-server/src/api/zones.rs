//! Hazard-zone endpoints: /impact, /nearby, /sync, /zones.
//!
//! Zone records come from the external store through its read-only query
//! surface. Unauthenticated callers see verified zones only; the configured
//! bearer token widens reads to unverified records.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use wayline_core::geojson::RouteFeature;
use wayline_core::matcher;
use wayline_core::models::{BoundingBox, HazardZone, ImpactResult, NearbyZone, VersionToken};
use wayline_core::query;

use crate::api::routes::{compute_route, parse_coordinate};
use crate::config::Config;
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_NEARBY_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct ImpactQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub algorithm: Option<String>,
    pub tolerance: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ImpactResponse {
    pub route: RouteFeature,
    pub count: usize,
    pub zones: Vec<ImpactResult>,
}

/// `GET /impact?from=lat,lon&to=lat,lon&tolerance=meters`
///
/// Computes a route the same way `/route` does, then reports which zones
/// cross the buffered corridor around it.
pub async fn route_impact(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ImpactQuery>,
) -> Result<Json<ImpactResponse>, ApiError> {
    let start = parse_coordinate(params.from.as_deref(), "from")?;
    let end = parse_coordinate(params.to.as_deref(), "to")?;

    let tolerance = params.tolerance.unwrap_or(state.config.default_tolerance_m);
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(ApiError::BadRequest(format!(
            "tolerance must be a non-negative number of meters, got {tolerance}"
        )));
    }

    // Match against the full geometry, not the capped feature output.
    let (points, route) = compute_route(&state, params.algorithm.as_deref(), start, end).await?;

    let verified_only = !trusted_caller(&headers, &state.config);
    let zones = state.store.list_active(verified_only, None).await?;
    let impacted = matcher::impacted_zones(&points, &zones, tolerance);

    Ok(Json(ImpactResponse {
        route,
        count: impacted.len(),
        zones: impacted,
    }))
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub at: Option<String>,
    pub radius: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    pub count: usize,
    pub zones: Vec<NearbyZone>,
}

/// `GET /nearby?at=lat,lon&radius=meters&limit=n`
pub async fn nearby_zones(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<NearbyQuery>,
) -> Result<Json<NearbyResponse>, ApiError> {
    let origin = parse_coordinate(params.at.as_deref(), "at")?;

    if let Some(radius) = params.radius {
        if !radius.is_finite() || radius < 0.0 {
            return Err(ApiError::BadRequest(format!(
                "radius must be a non-negative number of meters, got {radius}"
            )));
        }
    }
    let limit = params.limit.unwrap_or(DEFAULT_NEARBY_LIMIT);

    let verified_only = !trusted_caller(&headers, &state.config);
    let zones = state.store.list_active(verified_only, None).await?;
    let ranked = query::nearest_zones(&zones, origin, params.radius, limit);

    Ok(Json(NearbyResponse {
        count: ranked.len(),
        zones: ranked,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SyncQuery {
    pub at: Option<String>,
    pub radius: Option<f64>,
    pub version: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub new_version: String,
    pub count: usize,
    pub records: Vec<HazardZone>,
}

/// `GET /sync?version=token&at=lat,lon&radius=meters`
///
/// Versioned delta query: returns the zones updated since the given token,
/// optionally bounded to a radius around a point, plus the next token.
pub async fn delta_sync(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<SyncQuery>,
) -> Result<Json<SyncResponse>, ApiError> {
    let token = VersionToken::parse(params.version.as_deref()).map_err(ApiError::BadRequest)?;

    let scope = match (params.at.as_deref(), params.radius) {
        (Some(at), Some(radius)) => {
            if !radius.is_finite() || radius < 0.0 {
                return Err(ApiError::BadRequest(format!(
                    "radius must be a non-negative number of meters, got {radius}"
                )));
            }
            Some((parse_coordinate(Some(at), "at")?, radius))
        }
        (None, Some(_)) => {
            return Err(ApiError::BadRequest(
                "radius requires an \"at\" center point".to_string(),
            ));
        }
        (Some(at), None) => {
            // A bare point without a radius does not bound the scope, but it
            // must still be a valid point.
            parse_coordinate(Some(at), "at")?;
            None
        }
        (None, None) => None,
    };

    let verified_only = !trusted_caller(&headers, &state.config);
    let zones = state.store.list_active(verified_only, None).await?;
    let delta = query::delta_sync(&zones, scope, token);

    Ok(Json(SyncResponse {
        new_version: delta.new_token.encode(),
        count: delta.records.len(),
        records: delta.records,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ZonesQuery {
    pub bbox: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ZonesResponse {
    pub count: usize,
    pub zones: Vec<HazardZone>,
}

/// `GET /zones?bbox=min_lon,min_lat,max_lon,max_lat`
///
/// Active zones, optionally filtered by a center-point bounding box. An
/// unparseable bbox is ignored rather than rejected.
pub async fn list_zones(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ZonesQuery>,
) -> Result<Json<ZonesResponse>, ApiError> {
    let bbox = params.bbox.as_deref().and_then(parse_bbox);

    let verified_only = !trusted_caller(&headers, &state.config);
    let zones = state.store.list_active(verified_only, bbox.as_ref()).await?;

    Ok(Json(ZonesResponse {
        count: zones.len(),
        zones,
    }))
}

fn parse_bbox(raw: &str) -> Option<BoundingBox> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    let [min_lon, min_lat, max_lon, max_lat] = parts.as_slice() else {
        return None;
    };
    if min_lat > max_lat || min_lon > max_lon {
        return None;
    }
    Some(BoundingBox {
        min_lat: *min_lat,
        max_lat: *max_lat,
        min_lon: *min_lon,
        max_lon: *max_lon,
    })
}

/// Whether the caller presented the configured read-scope token.
fn trusted_caller(headers: &HeaderMap, config: &Config) -> bool {
    let Some(expected) = config.api_token.as_deref() else {
        return false;
    };
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token == expected)
        .unwrap_or(false)
}
