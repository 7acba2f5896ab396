//! Routing endpoints: /route, /algorithms, /health.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use wayline_core::geojson::RouteFeature;
use wayline_core::metrics;
use wayline_core::Coordinate;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub algorithm: Option<String>,
}

/// `GET /route?from=lat,lon&to=lat,lon&algorithm=name`
pub async fn get_route(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<RouteFeature>, ApiError> {
    let start = parse_coordinate(query.from.as_deref(), "from")?;
    let end = parse_coordinate(query.to.as_deref(), "to")?;

    let (_, feature) = compute_route(&state, query.algorithm.as_deref(), start, end).await?;
    Ok(Json(feature))
}

/// `GET /algorithms` — catalog of registered providers.
pub async fn list_algorithms(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "algorithms": state.registry.algorithms(),
        "default": state.registry.default_algorithm(),
    }))
}

/// `GET /health` — degraded when the trivial self-test route fails.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let healthy = match (Coordinate::new(0.0, 0.0), Coordinate::new(0.01, 0.01)) {
        (Ok(start), Ok(end)) => matches!(
            state.registry.route(Some("direct"), start, end).await,
            Ok((_, ref points)) if points.len() == 2
        ),
        _ => false,
    };

    let body = json!({
        "status": if healthy { "healthy" } else { "degraded" },
        "service": "Wayline Routing Service",
        "version": env!("CARGO_PKG_VERSION"),
        "algorithms_available": state.registry.len(),
        "default_algorithm": state.registry.default_algorithm(),
    });

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

/// Resolve a provider, compute the route and assemble the feature.
///
/// Returns the raw points alongside the feature so callers that need the
/// full geometry (corridor matching) are not limited by coordinate capping.
pub(crate) async fn compute_route(
    state: &AppState,
    algorithm: Option<&str>,
    start: Coordinate,
    end: Coordinate,
) -> Result<(Vec<Coordinate>, RouteFeature), ApiError> {
    let (name, points) = state
        .registry
        .route(algorithm, start, end)
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let properties =
        metrics::route_properties(&points, &name, &state.routing.thresholds, &state.routing.speed);
    let feature = RouteFeature::line(&points, properties, state.config.max_coordinates);
    Ok((points, feature))
}

/// Parse a `lat,lon` query parameter.
pub(crate) fn parse_coordinate(raw: Option<&str>, param: &str) -> Result<Coordinate, ApiError> {
    let raw = raw.ok_or_else(|| {
        ApiError::BadRequest(format!(
            "missing required parameter \"{param}\" (expected \"lat,lon\")"
        ))
    })?;

    let (lat, lon) = raw.split_once(',').ok_or_else(|| {
        ApiError::BadRequest(format!("parameter \"{param}\" must be \"lat,lon\", got \"{raw}\""))
    })?;

    let lat: f64 = lat.trim().parse().map_err(|_| {
        ApiError::BadRequest(format!("invalid latitude in \"{param}\": \"{lat}\""))
    })?;
    let lon: f64 = lon.trim().parse().map_err(|_| {
        ApiError::BadRequest(format!("invalid longitude in \"{param}\": \"{lon}\""))
    })?;

    Coordinate::new(lat, lon).map_err(|err| ApiError::BadRequest(err.to_string()))
}
