//! Lichess Bot Service
//!
//! Plays on Lichess with the BlueHerring engine:
//! - accepts every incoming challenge (rematches included)
//! - follows each started game on its own task
//! - asks the engine for a move whenever it is our turn and submits it
//! - reconnects after any failure until interrupted with Ctrl-C

use anyhow::{Context, Result};
use dotenv::dotenv;
use herring_rust_core::{BotConfig, EngineProcess, LichessConnector, SupervisorLoop};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Lichess Bot Service...");

    let config = Arc::new(BotConfig::from_env().context("Failed to load bot configuration")?);
    config.log_config();

    let connector = Arc::new(LichessConnector::new(config.clone()));
    let engine = Arc::new(EngineProcess::from_config(&config));
    let supervisor = SupervisorLoop::new(&config, connector, engine);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                signal_token.cancel();
            }
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }
    });

    supervisor.run(shutdown).await;

    Ok(())
}
