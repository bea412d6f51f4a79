use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod service;
pub mod state;

use anvil_cluster::{ClusterClient, ClusterConfig};
use anvil_engine::EngineClient;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anvil_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Anvil deployment server...");

    let config = Config::from_env();
    config.validate()?;

    // Clients are constructed once and shared read-only for the process
    // lifetime
    let engine = Arc::new(EngineClient::new(config.engine_url.as_str()));
    let cluster = Arc::new(ClusterClient::new(&ClusterConfig::from_env())?);

    // Startup precondition: the build engine must answer before requests
    // are accepted
    engine
        .wait_ready(config.engine_ready_timeout, config.engine_ready_interval)
        .await?;

    let app = api::create_router(AppState { engine, cluster });

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
