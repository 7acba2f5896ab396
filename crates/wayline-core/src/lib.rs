//! Core routing and hazard-zone matching logic for Wayline.
//!
//! Pure computation only: geodesic primitives, the synthetic route
//! generators, route metrics, GeoJSON assembly and the corridor/proximity/
//! delta queries. Network- and database-backed providers live in the server
//! crate and implement the same [`providers::RouteProvider`] contract.

pub mod config;
pub mod geo;
pub mod geojson;
pub mod matcher;
pub mod metrics;
pub mod models;
pub mod providers;
pub mod query;

pub use config::RoutingConfig;
pub use geo::{Coordinate, CoordinateError};
pub use models::{HazardZone, VersionToken, ZoneCategory};
pub use providers::{ProviderError, RouteProvider};
