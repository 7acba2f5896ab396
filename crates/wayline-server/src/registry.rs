//! Backend registry: name-keyed providers and the per-request fallback
//! chain.
//!
//! The registry is built once at startup and immutable afterwards. External
//! backends register best-effort; a failed registration is logged and the
//! backend is simply absent. At request time any provider failure degrades
//! that request to a direct two-point line, never an error to the caller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use wayline_core::config::RoutingConfig;
use wayline_core::providers::{
    CurvedRoute, DirectRoute, GridRoute, ProviderError, RouteProvider, SmartRoute,
};
use wayline_core::Coordinate;

use crate::backends::graph::GraphBackend;
use crate::backends::remote::RemoteBackend;
use crate::backends::spatial_db::SpatialDbBackend;
use crate::config::Config;

/// Preferred listing order: data-backed providers first, then synthetic.
const LISTING_ORDER: [&str; 7] = [
    "graph", "spatial", "remote", "smart", "grid", "curved", "direct",
];

/// Catalog entry describing a registered provider.
#[derive(Debug, Clone, Serialize)]
pub struct AlgorithmInfo {
    pub name: String,
    pub description: String,
    pub best_for: String,
}

/// A registered provider: built-in generator or data-backed backend.
pub enum Backend {
    Builtin(Arc<dyn RouteProvider>),
    Graph(GraphBackend),
    SpatialDb(SpatialDbBackend),
    Remote(RemoteBackend),
}

impl Backend {
    async fn generate(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<Vec<Coordinate>, ProviderError> {
        match self {
            Backend::Builtin(provider) => provider.generate(start, end),
            Backend::Graph(backend) => backend.generate(start, end),
            Backend::SpatialDb(backend) => backend.generate(start, end).await,
            Backend::Remote(backend) => backend.generate(start, end).await,
        }
    }

    /// External backends do I/O and run under the request timeout.
    fn is_external(&self) -> bool {
        !matches!(self, Backend::Builtin(_))
    }
}

/// Raised when a request names an algorithm nobody registered.
#[derive(Debug, thiserror::Error)]
#[error("unknown algorithm: {name}. Available: {available:?}")]
pub struct UnknownAlgorithm {
    pub name: String,
    pub available: Vec<String>,
}

pub struct Registry {
    providers: HashMap<String, Backend>,
    default_backend: Option<String>,
    fallback_algorithm: String,
    backend_timeout: Duration,
}

impl Registry {
    /// Build the registry: synthetic generators always, external backends
    /// best-effort. Never fails.
    pub async fn build(config: &Config, routing: &RoutingConfig) -> Self {
        let mut providers: HashMap<String, Backend> = HashMap::new();

        providers.insert(
            "direct".to_string(),
            Backend::Builtin(Arc::new(DirectRoute)),
        );
        providers.insert(
            "smart".to_string(),
            Backend::Builtin(Arc::new(SmartRoute::new(
                routing.smart.clone(),
                routing.thresholds.clone(),
                config.route_seed,
            ))),
        );
        providers.insert(
            "grid".to_string(),
            Backend::Builtin(Arc::new(GridRoute::new(
                routing.grid.clone(),
                routing.thresholds.clone(),
            ))),
        );
        providers.insert(
            "curved".to_string(),
            Backend::Builtin(Arc::new(CurvedRoute::new(
                routing.curved.clone(),
                config.route_seed,
            ))),
        );

        match GraphBackend::register(config) {
            Ok(Some(backend)) => {
                providers.insert("graph".to_string(), Backend::Graph(backend));
            }
            Ok(None) => {}
            Err(err) => tracing::warn!("Road-graph backend not registered: {}", err),
        }

        match SpatialDbBackend::register(config).await {
            Ok(Some(backend)) => {
                providers.insert("spatial".to_string(), Backend::SpatialDb(backend));
            }
            Ok(None) => {}
            Err(err) => tracing::warn!("Spatial-db backend not registered: {}", err),
        }

        match RemoteBackend::register(config) {
            Ok(Some(backend)) => {
                providers.insert("remote".to_string(), Backend::Remote(backend));
            }
            Ok(None) => {}
            Err(err) => tracing::warn!("Remote backend not registered: {}", err),
        }

        let default_backend = match &config.default_backend {
            Some(name) if providers.contains_key(name) => Some(name.clone()),
            Some(name) => {
                tracing::warn!("Configured default backend '{}' is not registered", name);
                None
            }
            None => None,
        };

        let fallback_algorithm = if providers.contains_key(&config.fallback_algorithm) {
            config.fallback_algorithm.clone()
        } else {
            tracing::warn!(
                "Configured fallback algorithm '{}' is not registered, using smart",
                config.fallback_algorithm
            );
            "smart".to_string()
        };

        Self {
            providers,
            default_backend,
            fallback_algorithm,
            backend_timeout: Duration::from_secs(config.backend_timeout_s.max(1)),
        }
    }

    /// Compute a route, applying the selection order and the degrade-to-
    /// direct policy.
    ///
    /// Returns the resolved algorithm name along with the points. The only
    /// error is an unknown requested name; provider failures are logged and
    /// produce a direct line under the requested name.
    pub async fn route(
        &self,
        requested: Option<&str>,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<(String, Vec<Coordinate>), UnknownAlgorithm> {
        let name = match requested {
            Some(name) => {
                if !self.providers.contains_key(name) {
                    return Err(UnknownAlgorithm {
                        name: name.to_string(),
                        available: self.names(),
                    });
                }
                name
            }
            None => self.default_algorithm(),
        };
        let backend = &self.providers[name];

        let result = if backend.is_external() {
            match tokio::time::timeout(self.backend_timeout, backend.generate(start, end)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout),
            }
        } else {
            backend.generate(start, end).await
        };

        let points = match result {
            Ok(points) if points.len() >= 2 => points,
            Ok(_) => {
                tracing::warn!(
                    provider = name,
                    "provider returned degenerate geometry, falling back to direct line"
                );
                vec![start, end]
            }
            Err(err) => {
                tracing::warn!(
                    provider = name,
                    "provider failed, falling back to direct line: {}",
                    err
                );
                vec![start, end]
            }
        };

        Ok((name.to_string(), points))
    }

    /// The algorithm used when a request names none.
    pub fn default_algorithm(&self) -> &str {
        self.default_backend
            .as_deref()
            .unwrap_or(&self.fallback_algorithm)
    }

    /// Registered provider names, sorted for stable output.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Catalog of registered providers, data-backed entries first.
    pub fn algorithms(&self) -> Vec<AlgorithmInfo> {
        LISTING_ORDER
            .iter()
            .copied()
            .filter(|name| self.providers.contains_key(*name))
            .map(describe)
            .collect()
    }
}

fn describe(name: &str) -> AlgorithmInfo {
    let (description, best_for) = match name {
        "graph" => (
            "Road-graph routing over an imported network file (real roads)",
            "Accurate on-road routing within the imported map area",
        ),
        "spatial" => (
            "Shortest-path routing over the road-edge table in the spatial database",
            "Accurate on-road routing where the road database is loaded",
        ),
        "remote" => (
            "Delegates to an OSRM-compatible remote routing engine",
            "Production-grade on-road routing when the remote engine is reachable",
        ),
        "smart" => (
            "Intelligent routing with realistic detours and urban/highway awareness",
            "General purpose routing with realistic paths",
        ),
        "grid" => (
            "City-style routing following street grid patterns",
            "Urban areas with regular street grids",
        ),
        "curved" => (
            "Smooth curved routes suitable for highways and rural areas",
            "Highway and rural routing with gentle curves",
        ),
        _ => (
            "Straight-line routing for basic distance calculation",
            "Simple distance and bearing calculations",
        ),
    };
    AlgorithmInfo {
        name: name.to_string(),
        description: description.to_string(),
        best_for: best_for.to_string(),
    }
}
