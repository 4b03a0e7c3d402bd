//! Stream supervisor: keeps one filtered-stream connection open for the life
//! of the process.
//!
//! ```text
//! StreamSupervisor::run
//!     │
//!     ├─► connect ──────────────► Disconnect::Connect / TimedOut
//!     ├─► read lines (idle timeout per line)
//!     │       ├─► keep-alive: ignore
//!     │       └─► post: match ─► AlertDispatcher::spawn (not awaited)
//!     ├─► on any Disconnect: drop connection, sleep one backoff delay
//!     └─► loop until the shutdown token is cancelled
//! ```
//!
//! The attempt counter resets once a fresh connection delivers its first item,
//! so delays grow across connections that fail or stall without ever
//! producing anything and start over after a healthy one.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use twitter_client::{StreamEvent, StreamMessage, TwitterError};

use super::backoff::{Backoff, BackoffPolicy};
use crate::domains::alerts::{first_match, AlertDispatcher};
use crate::kernel::{BaseStreamConnector, EventStream};

/// Configuration for the stream supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// A connection that delivers nothing (not even a keep-alive) for this long is dead
    pub idle_timeout: Duration,
    /// How long shutdown waits for in-flight alerts before aborting them
    pub drain_timeout: Duration,
    pub backoff: BackoffPolicy,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(20),
            drain_timeout: Duration::from_secs(30),
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Why a connection ended. Every variant is retried the same way.
#[derive(Debug, Error)]
pub enum Disconnect {
    #[error("failed to open stream: {0}")]
    Connect(#[source] TwitterError),

    #[error("no data received for {0:?}")]
    TimedOut(Duration),

    #[error("stream transport error: {0}")]
    Transport(#[source] TwitterError),

    #[error("stream closed by server")]
    Closed,
}

pub struct StreamSupervisor {
    connector: Arc<dyn BaseStreamConnector>,
    phrases: Vec<String>,
    dispatcher: AlertDispatcher,
    config: SupervisorConfig,
}

impl StreamSupervisor {
    pub fn new(
        connector: Arc<dyn BaseStreamConnector>,
        phrases: Vec<String>,
        dispatcher: AlertDispatcher,
        config: SupervisorConfig,
    ) -> Self {
        Self {
            connector,
            phrases,
            dispatcher,
            config,
        }
    }

    /// Run until `shutdown` is cancelled, then wait (bounded) for in-flight alerts.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut backoff = Backoff::new(self.config.backoff.clone());
        let mut alerts = JoinSet::new();

        info!(
            idle_timeout_ms = self.config.idle_timeout.as_millis() as u64,
            phrases = self.phrases.len(),
            "stream supervisor starting"
        );

        loop {
            let disconnect = tokio::select! {
                _ = shutdown.cancelled() => break,
                disconnect = self.stream_once(&mut backoff, &mut alerts) => disconnect,
            };

            // The connection has been dropped by now; only the delay is pending.
            let delay = backoff.next_delay();
            warn!(
                reason = %disconnect,
                attempt = backoff.attempt(),
                delay_ms = delay.as_millis() as u64,
                "stream disconnected, reconnecting"
            );

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.drain_alerts(&mut alerts).await;
        info!("stream supervisor stopped");
    }

    /// Wait up to `drain_timeout` for in-flight alerts, then abort the rest.
    async fn drain_alerts(&self, alerts: &mut JoinSet<()>) {
        if alerts.is_empty() {
            return;
        }

        info!(count = alerts.len(), "waiting for in-flight alerts");
        let drained = tokio::time::timeout(self.config.drain_timeout, async {
            while alerts.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!(
                count = alerts.len(),
                timeout_ms = self.config.drain_timeout.as_millis() as u64,
                "abandoning alerts still in flight"
            );
            alerts.shutdown().await;
        }
    }

    /// Open one connection and read it until it ends.
    async fn stream_once(&self, backoff: &mut Backoff, alerts: &mut JoinSet<()>) -> Disconnect {
        debug!("connecting to stream");
        let mut stream: EventStream =
            match tokio::time::timeout(self.config.idle_timeout, self.connector.connect()).await {
                Err(_) => return Disconnect::TimedOut(self.config.idle_timeout),
                Ok(Err(e)) => return Disconnect::Connect(e),
                Ok(Ok(stream)) => stream,
            };
        info!("stream connected");

        let mut healthy = false;
        loop {
            let message = match tokio::time::timeout(self.config.idle_timeout, stream.next()).await {
                Err(_) => return Disconnect::TimedOut(self.config.idle_timeout),
                Ok(None) => return Disconnect::Closed,
                Ok(Some(Err(e))) => return Disconnect::Transport(e),
                Ok(Some(Ok(message))) => message,
            };

            if !healthy {
                healthy = true;
                backoff.reset();
            }

            // Reap finished alert tasks
            while alerts.try_join_next().is_some() {}

            match message {
                StreamMessage::KeepAlive => trace!("keep-alive"),
                StreamMessage::Post(event) => self.handle_event(&event, alerts),
            }
        }
    }

    fn handle_event(&self, event: &StreamEvent, alerts: &mut JoinSet<()>) {
        if event.data.is_none() {
            if let Some(errors) = &event.errors {
                warn!(errors = %errors, "stream reported errors");
            }
            return;
        }

        info!(
            post_id = event.post_id().unwrap_or("-"),
            text = event.text().unwrap_or_default(),
            "post received"
        );

        match first_match(event, &self.phrases) {
            Some(phrase) => {
                info!(phrase, "trigger phrase matched, sending alert");
                self.dispatcher.spawn(alerts);
            }
            None => debug!("no match"),
        }
    }
}
