// Dashboard Server Binary Entry Point
//
// Purpose: Load the model, scaler and dataset, then serve the dashboard
// Usage: cargo run --bin api_server

use plant_stress_dashboard::{create_router, AppState, DashboardConfig};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "plant_stress_dashboard=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting plant health dashboard...");

    let config = DashboardConfig::from_env();

    tracing::info!("Configuration:");
    tracing::info!("  DATA_DIR: {:?}", config.data_dir);
    tracing::info!("  MODEL_FILE: {:?}", config.paths.model);
    tracing::info!("  SCALER_FILE: {:?}", config.paths.scaler);
    tracing::info!("  DATASET_FILE: {:?}", config.paths.dataset);
    tracing::info!("  PORT: {}", config.port);

    // Missing or corrupt artifacts stop the server before it binds
    let state = AppState::new(&config).map_err(|e| {
        tracing::error!("Failed to load dashboard resources: {:#}", e);
        e
    })?;
    tracing::info!("Application state initialized successfully");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
