// Cost of Living Dashboard - Web Server
// Loads the dataset once, then serves per-session dashboards over HTTP

use anyhow::{Context, Result};
use cost_of_living::{
    load_from_config, logging, server, Dashboard, DashboardConfig, IndicatorCatalog,
};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenv().ok();

    let config = DashboardConfig::from_env()?;
    logging::init_logging(&config, "info")?;

    info!(
        region = %config.region,
        variant = ?config.variant,
        data_dir = %config.data_dir.display(),
        "starting dashboard server"
    );

    let catalog = IndicatorCatalog::standard();
    let table = match load_from_config(&config, &catalog) {
        Ok(table) => table,
        Err(e) => {
            // An incomplete dataset is fatal: never serve partial data
            error!(error = %e, "dataset failed to load");
            return Err(e).context("Failed to load dataset");
        }
    };

    let dashboard = Dashboard::new(Arc::new(table), catalog, config.variant);
    server::serve(&config, dashboard).await
}
