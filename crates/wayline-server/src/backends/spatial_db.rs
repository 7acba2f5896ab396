//! Route provider backed by a road-edge table in the spatial database.
//!
//! Endpoints are snapped to the nearest road vertex with a SQL
//! squared-degree ordering confirmed by an exact haversine check, then the
//! length-weighted shortest path is computed over the edge table. Missing
//! schema fails registration; snap misses and missing paths degrade the
//! request to a direct line via the registry.

use std::collections::HashMap;

use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use wayline_core::geo::{self, Coordinate};
use wayline_core::providers::ProviderError;

use super::RegistrationError;
use crate::config::Config;

/// Nearest-vertex snaps farther than this are rejected.
const SNAP_TOLERANCE_M: f64 = 2_000.0;

#[derive(sqlx::FromRow)]
struct VertexRow {
    id: i64,
    lat: f64,
    lon: f64,
}

#[derive(sqlx::FromRow)]
struct EdgeRow {
    source: i64,
    target: i64,
    length_m: f64,
}

pub struct SpatialDbBackend {
    pool: SqlitePool,
}

impl SpatialDbBackend {
    /// Attempt registration against the configured road database.
    ///
    /// Returns `Ok(None)` when no database is configured; a reachable
    /// database without the road schema is a registration error.
    pub async fn register(config: &Config) -> Result<Option<Self>, RegistrationError> {
        let Some(path) = config.road_db_path.as_deref() else {
            return Ok(None);
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect(&format!("sqlite:{}?mode=ro", path))
            .await?;

        for table in ["road_vertices", "road_edges"] {
            let present = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            )
            .bind(table)
            .fetch_one(&pool)
            .await?;
            if present == 0 {
                return Err(RegistrationError::MissingSchema(table));
            }
        }

        tracing::info!("Registered spatial-db backend from {}", path);
        Ok(Some(Self { pool }))
    }

    pub async fn generate(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<Vec<Coordinate>, ProviderError> {
        let source = self
            .nearest_vertex(start)
            .await?
            .ok_or(ProviderError::SnapMiss("start"))?;
        let target = self
            .nearest_vertex(end)
            .await?
            .ok_or(ProviderError::SnapMiss("end"))?;

        let mut points = self.shortest_path(source, target, end).await?;
        if points.len() < 2 {
            return Err(ProviderError::EmptyGeometry);
        }

        points[0] = start;
        let last = points.len() - 1;
        points[last] = end;
        Ok(points)
    }

    async fn nearest_vertex(&self, target: Coordinate) -> Result<Option<i64>, ProviderError> {
        // Squared-degree ordering with the longitude axis rescaled by
        // cos^2(lat) so the ordering approximates planar meters.
        let lon_scale = target.lat().to_radians().cos().powi(2).max(1e-9);
        let row = sqlx::query_as::<_, VertexRow>(
            "SELECT id, lat, lon FROM road_vertices \
             ORDER BY (lat - ?1) * (lat - ?1) + (lon - ?2) * (lon - ?2) * ?3 \
             LIMIT 1",
        )
        .bind(target.lat())
        .bind(target.lon())
        .bind(lon_scale)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| ProviderError::Backend(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let vertex = Coordinate::new(row.lat, row.lon)?;
        if geo::haversine_distance(target, vertex) <= SNAP_TOLERANCE_M {
            Ok(Some(row.id))
        } else {
            Ok(None)
        }
    }

    async fn shortest_path(
        &self,
        source: i64,
        target: i64,
        end: Coordinate,
    ) -> Result<Vec<Coordinate>, ProviderError> {
        let vertices = sqlx::query_as::<_, VertexRow>("SELECT id, lat, lon FROM road_vertices")
            .fetch_all(&self.pool)
            .await
            .map_err(|err| ProviderError::Backend(err.to_string()))?;
        let edges =
            sqlx::query_as::<_, EdgeRow>("SELECT source, target, length_m FROM road_edges")
                .fetch_all(&self.pool)
                .await
                .map_err(|err| ProviderError::Backend(err.to_string()))?;

        let mut graph: DiGraph<Coordinate, f64> = DiGraph::new();
        let mut id_to_index = HashMap::with_capacity(vertices.len());
        for vertex in &vertices {
            let coord = Coordinate::new(vertex.lat, vertex.lon)?;
            id_to_index.insert(vertex.id, graph.add_node(coord));
        }
        for edge in &edges {
            let (Some(&from), Some(&to)) =
                (id_to_index.get(&edge.source), id_to_index.get(&edge.target))
            else {
                continue;
            };
            let length = edge.length_m.max(0.0);
            graph.add_edge(from, to, length);
            graph.add_edge(to, from, length);
        }

        let source = *id_to_index.get(&source).ok_or(ProviderError::NoPath)?;
        let target_idx: NodeIndex = *id_to_index.get(&target).ok_or(ProviderError::NoPath)?;

        let (_cost, path) = astar(
            &graph,
            source,
            |finish| finish == target_idx,
            |edge| *edge.weight(),
            |idx| geo::haversine_distance(graph[idx], end),
        )
        .ok_or(ProviderError::NoPath)?;

        Ok(path.iter().map(|idx| graph[*idx]).collect())
    }
}
