use anyhow::Result;
use tracing::info;

use app_usage_api::{app, config, middleware, services::SnapshotSource};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::load()?;

    // Initialize logging
    middleware::logging::init_logging(&config.logging)?;
    middleware::init_metrics()?;

    info!("Starting App Usage API v{}", env!("CARGO_PKG_VERSION"));

    let snapshots = SnapshotSource::file(&config.snapshot.path);
    info!(snapshot = %snapshots.describe(), "Usage snapshot source configured");

    let addr = config.socket_addr()?;

    // Build application
    let app = app::create_app(config, snapshots);

    // Start server
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
