// Main entry point for the listing watcher

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use watcher_core::{app, kernel::WatcherDeps, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,watcher_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting listing watcher");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        rules = config.rules.len(),
        phrases = config.trigger_phrases.len(),
        "Configuration loaded"
    );

    let deps = WatcherDeps::from_config(&config);

    // Ctrl+C drops the open connection and stops reconnecting
    let shutdown = CancellationToken::new();
    tokio::spawn(app::cancel_on_signal(
        tokio::signal::ctrl_c(),
        shutdown.clone(),
    ));

    app::run(&config, &deps, shutdown).await?;

    tracing::info!("Listing watcher stopped");
    Ok(())
}
