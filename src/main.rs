mod config;
mod error;
mod gateway;
mod orders;
mod server;
mod webhook;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::gateway::TelegramGateway;
use crate::server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,order_relay=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Staff chat: {}", orders::recipient_param(&config.telegram.chat_id));
    info!("  Mini app: {}", config.telegram.web_app_url);
    info!("  Bot API: {}", config.telegram.api_url);
    info!("  Test environment: {}", config.telegram.test_environment);

    let gateway = Arc::new(TelegramGateway::new(&config.telegram));
    let state = AppState::new(config, gateway);

    server::run(state).await?;

    Ok(())
}
