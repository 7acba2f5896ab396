//! Wayline server - routing and hazard-zone API.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wayline_server::api;
use wayline_server::config::Config;
use wayline_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wayline_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting Wayline routing service...");

    let config = Config::from_env();
    let port = config.server_port;
    let state = Arc::new(AppState::initialize(config).await?);

    tracing::info!("Registered algorithms: {:?}", state.registry.names());
    tracing::info!("Default algorithm: {}", state.registry.default_algorithm());

    let app = api::routes()
        .with_state(state)
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
