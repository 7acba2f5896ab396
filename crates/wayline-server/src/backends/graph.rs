//! Road-graph route provider backed by an imported network file.
//!
//! The network is a JSON document of nodes and edges (an offline export of
//! an OSM extract). Endpoints are snapped to the nearest node via a KD-tree
//! and the path is the travel-time shortest path over the graph.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;

use kdtree::distance::squared_euclidean;
use kdtree::KdTree;
use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Deserialize;

use wayline_core::geo::{self, Coordinate};
use wayline_core::providers::ProviderError;

use super::RegistrationError;
use crate::config::Config;

/// Endpoints farther than this from any node cannot use the graph.
const SNAP_RADIUS_M: f64 = 1_000.0;
/// Floor for parsed edge speeds, keeps travel times finite.
const MIN_SPEED_KMH: f64 = 5.0;
const DEFAULT_SPEED_KMH: f64 = 50.0;
/// Heuristic divisor; admissible for any plausible road speed.
const MAX_ASSUMED_SPEED_MPS: f64 = 40.0;

#[derive(Debug, Deserialize)]
struct NetworkFile {
    nodes: Vec<NetworkNode>,
    edges: Vec<NetworkEdge>,
}

#[derive(Debug, Deserialize)]
struct NetworkNode {
    id: u64,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct NetworkEdge {
    from: u64,
    to: u64,
    length_m: f64,
    #[serde(default)]
    max_speed_kmh: Option<f64>,
    #[serde(default)]
    oneway: bool,
}

pub struct GraphBackend {
    /// Node weight is the node position; edge weight is travel time in
    /// seconds.
    graph: DiGraph<Coordinate, f64>,
    spatial_index: KdTree<f64, usize, [f64; 2]>,
}

impl GraphBackend {
    /// Attempt registration from the configured network file.
    ///
    /// Returns `Ok(None)` when no file is configured.
    pub fn register(config: &Config) -> Result<Option<Self>, RegistrationError> {
        let Some(path) = config.graph_path.as_deref() else {
            return Ok(None);
        };

        let file = File::open(path)?;
        let network: NetworkFile = serde_json::from_reader(BufReader::new(file))?;
        let backend = Self::from_network(network)?;
        tracing::info!(
            "Registered road-graph backend: {} nodes, {} edges from {}",
            backend.graph.node_count(),
            backend.graph.edge_count(),
            path
        );
        Ok(Some(backend))
    }

    fn from_network(network: NetworkFile) -> Result<Self, RegistrationError> {
        if network.nodes.is_empty() || network.edges.is_empty() {
            return Err(RegistrationError::EmptyNetwork);
        }

        let mut graph = DiGraph::new();
        let mut id_to_index = HashMap::with_capacity(network.nodes.len());
        let mut spatial_index = KdTree::new(2);

        for node in &network.nodes {
            let coord = Coordinate::new(node.lat, node.lon)
                .map_err(|_| RegistrationError::InvalidNode(node.id))?;
            let idx = graph.add_node(coord);
            id_to_index.insert(node.id, idx);
            let _ = spatial_index.add([coord.lon(), coord.lat()], idx.index());
        }

        for edge in &network.edges {
            let from = *id_to_index
                .get(&edge.from)
                .ok_or(RegistrationError::MissingNode(edge.from))?;
            let to = *id_to_index
                .get(&edge.to)
                .ok_or(RegistrationError::MissingNode(edge.to))?;

            let speed_kmh = edge
                .max_speed_kmh
                .unwrap_or(DEFAULT_SPEED_KMH)
                .max(MIN_SPEED_KMH);
            let speed_mps = speed_kmh * 1000.0 / 3600.0;
            let travel_time_s = edge.length_m.max(0.0) / speed_mps;

            graph.add_edge(from, to, travel_time_s);
            if !edge.oneway {
                graph.add_edge(to, from, travel_time_s);
            }
        }

        Ok(Self {
            graph,
            spatial_index,
        })
    }

    pub fn generate(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<Vec<Coordinate>, ProviderError> {
        let source = self.snap(start).ok_or(ProviderError::SnapMiss("start"))?;
        let target = self.snap(end).ok_or(ProviderError::SnapMiss("end"))?;

        let (_cost, path) = astar(
            &self.graph,
            source,
            |finish| finish == target,
            |edge| *edge.weight(),
            |idx| geo::haversine_distance(self.graph[idx], end) / MAX_ASSUMED_SPEED_MPS,
        )
        .ok_or(ProviderError::NoPath)?;

        let mut points: Vec<Coordinate> = path.iter().map(|idx| self.graph[*idx]).collect();
        if points.is_empty() {
            return Err(ProviderError::EmptyGeometry);
        }

        // Interior points follow the road network; endpoints stay exact.
        points[0] = start;
        let last = points.len() - 1;
        points[last] = end;
        if points.len() < 2 {
            points = vec![start, end];
        }
        Ok(points)
    }

    fn snap(&self, target: Coordinate) -> Option<NodeIndex> {
        let nearest = self
            .spatial_index
            .nearest(&[target.lon(), target.lat()], 1, &squared_euclidean)
            .ok()?;
        let (_dist_sq, &idx) = nearest.first()?;

        let node = self.graph[NodeIndex::new(idx)];
        if geo::haversine_distance(target, node) <= SNAP_RADIUS_M {
            Some(NodeIndex::new(idx))
        } else {
            None
        }
    }
}
