//! Shared application state, built once at startup and immutable after.

use anyhow::Result;

use wayline_core::config::RoutingConfig;

use crate::config::Config;
use crate::registry::Registry;
use crate::store::ZoneStore;

pub struct AppState {
    pub config: Config,
    pub routing: RoutingConfig,
    pub registry: Registry,
    pub store: ZoneStore,
}

impl AppState {
    pub async fn initialize(config: Config) -> Result<Self> {
        let routing = RoutingConfig::default();
        let store = ZoneStore::connect(&config.database_path, config.database_max_connections)
            .await?;
        let registry = Registry::build(&config, &routing).await;

        Ok(Self {
            config,
            routing,
            registry,
            store,
        })
    }
}
