//! API routes for the Wayline server.

pub mod routes;
pub mod zones;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/route", get(routes::get_route))
        .route("/algorithms", get(routes::list_algorithms))
        .route("/health", get(routes::health))
        .route("/impact", get(zones::route_impact))
        .route("/nearby", get(zones::nearby_zones))
        .route("/sync", get(zones::delta_sync))
        .route("/zones", get(zones::list_zones))
}

#[cfg(test)]
mod tests;
