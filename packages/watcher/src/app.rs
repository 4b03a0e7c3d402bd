//! Startup sequence: rule sync, then the stream supervisor.

use std::future::Future;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::domains::alerts::AlertDispatcher;
use crate::domains::rules::RuleSynchronizer;
use crate::domains::stream::StreamSupervisor;
use crate::kernel::WatcherDeps;

/// Sync rules, then stream until `shutdown` is cancelled.
///
/// A rule sync failure is returned before any stream connection is attempted.
pub async fn run(config: &Config, deps: &WatcherDeps, shutdown: CancellationToken) -> Result<()> {
    tracing::info!(rules = config.rules.len(), "Synchronizing stream rules");
    RuleSynchronizer::new(deps.rules.as_ref())
        .synchronize(&config.rules)
        .await
        .context("Failed to synchronize stream rules")?;

    let dispatcher = AlertDispatcher::from_config(deps.sms.clone(), config);
    let supervisor = StreamSupervisor::new(
        deps.stream.clone(),
        config.trigger_phrases.clone(),
        dispatcher,
        config.supervisor_config(),
    );

    supervisor.run(shutdown).await;
    Ok(())
}

/// Cancel `shutdown` when `signal` fires.
///
/// If the listener itself fails the token is left alone: the watcher keeps
/// running and can only be stopped by killing the process.
pub async fn cancel_on_signal<F>(signal: F, shutdown: CancellationToken)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            tracing::info!("received shutdown signal");
            shutdown.cancel();
        }
        Err(e) => tracing::error!(error = %e, "failed to listen for shutdown signal"),
    }
}
