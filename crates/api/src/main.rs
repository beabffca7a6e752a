//! Vehicle Safety Dashboard - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_logging(&config.logging).context("initializing logging")?;

    info!("=== Vehicle Safety Dashboard v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Reading sensor logs from {}", config.server.log_root);

    run_server(config).await.context("running API server")?;

    Ok(())
}
