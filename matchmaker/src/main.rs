use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use matchmaker::config::ConfigManager;
use matchmaker::database::Database;
use matchmaker::scheduler::SweepScheduler;
use matchmaker::services::{DissolutionService, InactivitySweepService};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("matchmaker=info".parse()?)
        .add_directive("tokio_cron_scheduler=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting match engine background worker");

    let config_dir = std::env::var("MATCHMAKER_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let config_manager = ConfigManager::new(config_dir).await?;
    let config = config_manager.get_current_config();

    // Creates the schema on first start
    let database = Arc::new(Database::connect(&config).await?);
    info!("Database initialized at {}", config.database_path);

    let dissolution_service = Arc::new(DissolutionService::new(database.clone()));
    let sweep_service = Arc::new(InactivitySweepService::new(
        config.clone(),
        database.clone(),
        dissolution_service,
    ));

    let mut scheduler = SweepScheduler::new(config.clone(), sweep_service).await?;
    let jobs = scheduler.start().await?;

    if jobs == 0 {
        warn!("No background jobs enabled; set inactivity_sweep_enabled = true in config/main.toml");
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    if jobs > 0 {
        scheduler.shutdown().await?;
    }
    database.pool().close().await;

    info!("Match engine worker stopped");
    Ok(())
}
