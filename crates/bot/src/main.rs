mod panel;
mod updates;

use std::sync::Arc;

use tokio::sync::RwLock;

use herald_common::config::Config;
use herald_engine::{DeliveryState, Scheduler};
use herald_transport::TelegramClient;

use crate::updates::UpdateLoop;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "herald_bot=info,herald_engine=info,herald_transport=info".into()
            }),
        )
        .json()
        .init();

    tracing::info!("Herald starting...");

    dotenvy::dotenv().ok();

    // Load configuration
    let config_path =
        std::env::var("HERALD_CONFIG").unwrap_or_else(|_| "config.json".to_string());
    let config = Config::load(&config_path)?;
    tracing::info!(path = %config_path, chats = config.chat_ids.len(), "Configuration loaded");

    let client = Arc::new(TelegramClient::new(&config.token)?);
    let interval_minutes = config.post_minutes;
    let config = Arc::new(RwLock::new(config));
    let state = Arc::new(DeliveryState::new());
    let scheduler = Arc::new(Scheduler::new(config.clone(), client.clone(), state));

    // Broadcasting begins right away with the persisted interval; the admin
    // panel can stop or reconfigure it at any time.
    scheduler.start(interval_minutes);

    let mut update_loop = UpdateLoop::new(config, client, scheduler.clone());

    // Run with graceful shutdown on Ctrl+C
    tokio::select! {
        _ = update_loop.run() => {
            tracing::error!("Update loop exited unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
    }

    scheduler.stop();
    tracing::info!("Herald stopped.");
    Ok(())
}
