use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::config::Config;
use crate::kernel::BaseSmsService;

/// Provider-assigned id of a sent message
pub type DeliveryId = String;

/// Sends the fixed alert SMS. Cheap to clone.
#[derive(Clone)]
pub struct AlertDispatcher {
    sms: Arc<dyn BaseSmsService>,
    from: Arc<str>,
    to: Arc<str>,
    body: Arc<str>,
}

impl AlertDispatcher {
    pub fn new(sms: Arc<dyn BaseSmsService>, from: &str, to: &str, body: &str) -> Self {
        Self {
            sms,
            from: from.into(),
            to: to.into(),
            body: body.into(),
        }
    }

    pub fn from_config(sms: Arc<dyn BaseSmsService>, config: &Config) -> Self {
        Self::new(sms, &config.from_phone, &config.to_phone, &config.alert_body)
    }

    /// Send one alert. No retry.
    pub async fn dispatch(&self) -> Result<DeliveryId> {
        self.sms.send_sms(&self.from, &self.to, &self.body).await
    }

    /// Send one alert on a detached task; the outcome is only logged.
    pub fn spawn(&self, tasks: &mut JoinSet<()>) {
        let dispatcher = self.clone();
        tasks.spawn(async move {
            match dispatcher.dispatch().await {
                Ok(sid) => info!(sid = %sid, to = %dispatcher.to, "alert sent"),
                Err(e) => error!(error = %e, to = %dispatcher.to, "failed to send alert"),
            }
        });
    }
}
