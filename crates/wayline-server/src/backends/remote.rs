//! Remote HTTP routing engine provider.
//!
//! Talks to any OSRM-compatible service:
//! `{base}/route/v1/{profile}/{lon},{lat};{lon},{lat}` with
//! `overview=full&geometries=geojson`. Non-2xx responses and malformed
//! geometry surface as provider errors and degrade to a direct line.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use wayline_core::geo::Coordinate;
use wayline_core::providers::ProviderError;

use super::RegistrationError;
use crate::config::Config;

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    #[serde(rename = "type")]
    geometry_type: String,
    #[serde(default)]
    coordinates: Vec<[f64; 2]>,
}

pub struct RemoteBackend {
    client: Client,
    base_url: String,
    profile: String,
}

impl RemoteBackend {
    /// Attempt registration for the configured remote engine.
    ///
    /// Only the client is built here; reachability is a per-request concern
    /// handled by the registry's fallback chain.
    pub fn register(config: &Config) -> Result<Option<Self>, RegistrationError> {
        let Some(url) = config.remote_url.as_deref() else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.backend_timeout_s.max(1)))
            .build()
            .map_err(|err| RegistrationError::Client(err.to_string()))?;

        tracing::info!("Registered remote routing backend at {}", url);
        Ok(Some(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            profile: config.remote_profile.clone(),
        }))
    }

    pub async fn generate(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<Vec<Coordinate>, ProviderError> {
        let url = format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}",
            self.base_url,
            self.profile,
            start.lon(),
            start.lat(),
            end.lon(),
            end.lat(),
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("overview", "full"),
                ("geometries", "geojson"),
                ("alternatives", "false"),
                ("steps", "false"),
            ])
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Backend(err.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ProviderError::Backend(format!(
                "remote engine returned HTTP {}",
                response.status()
            )));
        }

        let payload: OsrmResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::Backend(err.to_string()))?;

        let route = payload
            .routes
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyGeometry)?;
        if route.geometry.geometry_type != "LineString" || route.geometry.coordinates.len() < 2 {
            return Err(ProviderError::EmptyGeometry);
        }

        let mut points = Vec::with_capacity(route.geometry.coordinates.len());
        for [lon, lat] in route.geometry.coordinates {
            points.push(Coordinate::new(lat, lon)?);
        }

        points[0] = start;
        let last = points.len() - 1;
        points[last] = end;
        Ok(points)
    }
}
