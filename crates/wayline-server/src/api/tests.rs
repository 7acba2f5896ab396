use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use wayline_core::geo::{self, Coordinate};
use wayline_core::models::{HazardZone, ZoneCategory};

use crate::{api, config::Config, state::AppState};

const API_TOKEN: &str = "test-api-token";

fn test_config() -> Config {
    Config {
        server_port: 0,
        database_path: std::env::temp_dir()
            .join(format!("wayline-test-{}.db", uuid::Uuid::new_v4()))
            .to_string_lossy()
            .to_string(),
        database_max_connections: 2,
        default_backend: None,
        fallback_algorithm: "smart".to_string(),
        graph_path: None,
        road_db_path: None,
        remote_url: None,
        remote_profile: "driving".to_string(),
        backend_timeout_s: 5,
        max_coordinates: 200,
        default_tolerance_m: 100.0,
        route_seed: Some(42),
        api_token: Some(API_TOKEN.to_string()),
    }
}

async fn setup_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(
        AppState::initialize(test_config())
            .await
            .expect("initialize state"),
    );
    let app = api::routes().with_state(state.clone());
    (app, state)
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

async fn get(app: &axum::Router, uri: &str) -> axum::response::Response {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    app.clone().oneshot(request).await.expect("send request")
}

async fn get_authed(app: &axum::Router, uri: &str) -> axum::response::Response {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {}", API_TOKEN))
        .body(Body::empty())
        .expect("build request");
    app.clone().oneshot(request).await.expect("send request")
}

fn coord(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).unwrap()
}

/// Square zone of the given half-size in degrees around a center.
fn square_zone(id: &str, center: Coordinate, half_deg: f64, verified: bool) -> HazardZone {
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
        verified,
        active: true,
        updated_at: Utc::now(),
    }
}

const TASHKENT_ROUTE: &str = "from=41.2995,69.2401&to=41.3158,69.2785";

#[tokio::test]
async fn direct_route_matches_haversine() {
    let (app, _state) = setup_app().await;

    let response = get(&app, &format!("/route?{}&algorithm=direct", TASHKENT_ROUTE)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;

    assert_eq!(body["type"], "Feature");
    assert_eq!(body["geometry"]["type"], "LineString");
    let coords = body["geometry"]["coordinates"].as_array().unwrap();
    assert_eq!(coords.len(), 2);
    // GeoJSON order is [lon, lat].
    assert_eq!(coords[0][0].as_f64().unwrap(), 69.2401);
    assert_eq!(coords[0][1].as_f64().unwrap(), 41.2995);

    let expected = geo::haversine_distance(coord(41.2995, 69.2401), coord(41.3158, 69.2785));
    let distance = body["properties"]["distance_m"].as_f64().unwrap();
    assert!(
        (distance - expected).abs() < 1.0,
        "distance {distance} != haversine {expected}"
    );
    assert_eq!(body["properties"]["algorithm"], "direct");
}

#[tokio::test]
async fn grid_route_beats_direct_waypoint_count() {
    let (app, _state) = setup_app().await;

    let response = get(&app, &format!("/route?{}&algorithm=grid", TASHKENT_ROUTE)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;

    let count = body["geometry"]["coordinates"].as_array().unwrap().len();
    assert!((3..=16).contains(&count), "unexpected count {count}");
    assert!(count > 2);
}

#[tokio::test]
async fn route_endpoints_always_match_the_request() {
    let (app, _state) = setup_app().await;

    for algorithm in ["direct", "smart", "grid", "curved"] {
        let response = get(
            &app,
            &format!("/route?{}&algorithm={}", TASHKENT_ROUTE, algorithm),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        let coords = body["geometry"]["coordinates"].as_array().unwrap();

        let first = coords.first().unwrap();
        let last = coords.last().unwrap();
        assert_eq!(
            (first[0].as_f64().unwrap(), first[1].as_f64().unwrap()),
            (69.2401, 41.2995),
            "{algorithm} moved the start"
        );
        assert_eq!(
            (last[0].as_f64().unwrap(), last[1].as_f64().unwrap()),
            (69.2785, 41.3158),
            "{algorithm} moved the end"
        );
    }
}

#[tokio::test]
async fn invalid_route_requests_are_rejected() {
    let (app, _state) = setup_app().await;

    // Missing "to".
    let response = get(&app, "/route?from=41.2995,69.2401").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Malformed coordinate.
    let response = get(&app, "/route?from=41.2995&to=41.3158,69.2785").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Latitude out of range.
    let response = get(&app, "/route?from=91.5,69.2401&to=41.3158,69.2785").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Invalid input");

    // Unknown algorithm.
    let response = get(&app, &format!("/route?{}&algorithm=teleport", TASHKENT_ROUTE)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("unknown algorithm"));
}

#[tokio::test]
async fn algorithms_catalog_lists_builtins_and_default() {
    let (app, _state) = setup_app().await;

    let response = get(&app, "/algorithms").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;

    let names: Vec<&str> = body["algorithms"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["name"].as_str().unwrap())
        .collect();
    for name in ["smart", "grid", "curved", "direct"] {
        assert!(names.contains(&name), "missing {name}");
    }
    assert_eq!(body["default"], "smart");

    for entry in body["algorithms"].as_array().unwrap() {
        assert!(entry["description"].as_str().is_some());
        assert!(entry["best_for"].as_str().is_some());
    }
}

#[tokio::test]
async fn health_reports_registered_algorithms() {
    let (app, _state) = setup_app().await;

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["algorithms_available"], 4);
    assert_eq!(body["default_algorithm"], "smart");
}

#[tokio::test]
async fn impact_reports_zones_crossing_the_corridor() {
    let (app, state) = setup_app().await;

    let start = coord(41.2995, 69.2401);
    let end = coord(41.3158, 69.2785);
    let midpoint = geo::interpolate(start, end, 0.5);

    state
        .store
        .upsert_zone(&square_zone("on-route", midpoint, 0.002, true))
        .await
        .unwrap();
    state
        .store
        .upsert_zone(&square_zone("far-away", coord(41.53, 69.26), 0.002, true))
        .await
        .unwrap();

    let response = get(&app, &format!("/impact?{}&algorithm=direct", TASHKENT_ROUTE)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;

    assert_eq!(body["count"], 1);
    assert_eq!(body["zones"][0]["id"], "on-route");
    assert_eq!(body["zones"][0]["intersects"], true);
    assert_eq!(body["route"]["type"], "Feature");
}

#[tokio::test]
async fn impact_hides_unverified_zones_from_anonymous_callers() {
    let (app, state) = setup_app().await;

    let start = coord(41.2995, 69.2401);
    let end = coord(41.3158, 69.2785);
    let midpoint = geo::interpolate(start, end, 0.5);

    state
        .store
        .upsert_zone(&square_zone("unverified", midpoint, 0.002, false))
        .await
        .unwrap();

    let uri = format!("/impact?{}&algorithm=direct", TASHKENT_ROUTE);

    let anonymous = read_json(get(&app, &uri).await).await;
    assert_eq!(anonymous["count"], 0);

    let trusted = read_json(get_authed(&app, &uri).await).await;
    assert_eq!(trusted["count"], 1);
    assert_eq!(trusted["zones"][0]["id"], "unverified");
}

#[tokio::test]
async fn impact_rejects_negative_tolerance() {
    let (app, _state) = setup_app().await;
    let response = get(
        &app,
        &format!("/impact?{}&tolerance=-5", TASHKENT_ROUTE),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn nearby_ranks_by_distance_and_honors_limit_and_radius() {
    let (app, state) = setup_app().await;

    let origin = coord(41.30, 69.25);
    state
        .store
        .upsert_zone(&square_zone("near", coord(41.301, 69.25), 0.001, true))
        .await
        .unwrap();
    state
        .store
        .upsert_zone(&square_zone("mid", coord(41.32, 69.25), 0.001, true))
        .await
        .unwrap();
    state
        .store
        .upsert_zone(&square_zone("far", coord(41.40, 69.25), 0.001, true))
        .await
        .unwrap();

    let body = read_json(get(&app, "/nearby?at=41.30,69.25").await).await;
    assert_eq!(body["count"], 3);
    assert_eq!(body["zones"][0]["id"], "near");
    assert_eq!(body["zones"][2]["id"], "far");
    let d0 = body["zones"][0]["distance_m"].as_f64().unwrap();
    let expected = geo::haversine_distance(origin, coord(41.301, 69.25));
    assert!((d0 - expected).abs() < 1.0);

    let body = read_json(get(&app, "/nearby?at=41.30,69.25&limit=1").await).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["zones"][0]["id"], "near");

    // ~2.2 km radius keeps "near" and "mid" out of reach of "far".
    let body = read_json(get(&app, "/nearby?at=41.30,69.25&radius=2500").await).await;
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn sync_full_resync_then_replay_returns_nothing() {
    let (app, state) = setup_app().await;

    let mut old_zone = square_zone("old", coord(41.30, 69.25), 0.001, true);
    old_zone.updated_at = Utc::now() - Duration::minutes(60);
    state.store.upsert_zone(&old_zone).await.unwrap();
    state
        .store
        .upsert_zone(&square_zone("fresh", coord(41.31, 69.26), 0.001, true))
        .await
        .unwrap();

    let body = read_json(get(&app, "/sync?version=0").await).await;
    assert_eq!(body["count"], 2);
    let new_version = body["new_version"].as_str().unwrap().to_string();
    assert_ne!(new_version, "0");

    // No intervening updates: replaying the returned token yields nothing.
    let body = read_json(get(&app, &format!("/sync?version={new_version}")).await).await;
    assert_eq!(body["count"], 0);
    assert_eq!(body["new_version"].as_str().unwrap(), new_version);
}

#[tokio::test]
async fn sync_with_cursor_returns_only_newer_records() {
    let (app, state) = setup_app().await;

    let mut old_zone = square_zone("old", coord(41.30, 69.25), 0.001, true);
    old_zone.updated_at = Utc::now() - Duration::minutes(60);
    state.store.upsert_zone(&old_zone).await.unwrap();
    state
        .store
        .upsert_zone(&square_zone("fresh", coord(41.31, 69.26), 0.001, true))
        .await
        .unwrap();

    let cursor = wayline_core::VersionToken::Since(Utc::now() - Duration::minutes(30)).encode();
    let body = read_json(get(&app, &format!("/sync?version={cursor}")).await).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["records"][0]["id"], "fresh");
}

#[tokio::test]
async fn sync_radius_bounds_the_scope() {
    let (app, state) = setup_app().await;

    state
        .store
        .upsert_zone(&square_zone("inside", coord(41.301, 69.251), 0.001, true))
        .await
        .unwrap();
    state
        .store
        .upsert_zone(&square_zone("outside", coord(41.40, 69.40), 0.001, true))
        .await
        .unwrap();

    let body =
        read_json(get(&app, "/sync?version=0&at=41.30,69.25&radius=2000").await).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["records"][0]["id"], "inside");

    // A radius without a center point is an input error.
    let response = get(&app, "/sync?version=0&radius=2000").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(&app, "/sync?version=yesterday").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn zones_listing_applies_bbox_and_skips_corrupt_rows() {
    let (app, state) = setup_app().await;

    state
        .store
        .upsert_zone(&square_zone("inside", coord(41.30, 69.25), 0.001, true))
        .await
        .unwrap();
    state
        .store
        .upsert_zone(&square_zone("outside", coord(41.50, 69.50), 0.001, true))
        .await
        .unwrap();

    // A record whose stored geometry is not valid JSON must be skipped, not
    // break the listing.
    sqlx::query(
        "INSERT INTO hazard_zones (id, category, boundary, center_lat, center_lon, verified, active, updated_at) \
         VALUES ('corrupt', 'other', 'not-json', 41.30, 69.25, 1, 1, ?1)",
    )
    .bind(Utc::now().to_rfc3339())
    .execute(state.store.pool())
    .await
    .unwrap();

    let body = read_json(get(&app, "/zones").await).await;
    assert_eq!(body["count"], 2);

    let body = read_json(get(&app, "/zones?bbox=69.2,41.2,69.3,41.4").await).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["zones"][0]["id"], "inside");

    // Unparseable bbox filters are ignored, matching the lenient listing.
    let body = read_json(get(&app, "/zones?bbox=bogus").await).await;
    assert_eq!(body["count"], 2);
}
