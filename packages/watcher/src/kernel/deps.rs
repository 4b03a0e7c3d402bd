//! Watcher dependencies (using traits for testability)
//!
//! All external services are reached through trait abstractions so the
//! synchronizer and supervisor can run against mocks.

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use twilio::{TwilioOptions, TwilioService};
use twitter_client::{Rule, RulesMutationResponse, RulesResponse, TwitterClient};

use crate::config::Config;
use crate::kernel::{BaseRulesApi, BaseSmsService, BaseStreamConnector, EventStream};

// =============================================================================
// TwitterClient Adapter (implements BaseRulesApi + BaseStreamConnector)
// =============================================================================

/// Wrapper around TwitterClient that implements the rules and stream traits
pub struct TwitterAdapter(pub Arc<TwitterClient>);

impl TwitterAdapter {
    pub fn new(client: Arc<TwitterClient>) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseRulesApi for TwitterAdapter {
    async fn get_rules(&self) -> twitter_client::Result<RulesResponse> {
        self.0.get_rules().await
    }

    async fn delete_rules(&self, ids: &[String]) -> twitter_client::Result<RulesMutationResponse> {
        self.0.delete_rules(ids).await
    }

    async fn add_rules(&self, rules: &[Rule]) -> twitter_client::Result<RulesMutationResponse> {
        self.0.add_rules(rules).await
    }
}

#[async_trait]
impl BaseStreamConnector for TwitterAdapter {
    async fn connect(&self) -> twitter_client::Result<EventStream> {
        Ok(self.0.connect_stream().await?.boxed())
    }
}

// =============================================================================
// TwilioService Adapter (implements BaseSmsService)
// =============================================================================

/// Wrapper around TwilioService that implements BaseSmsService trait
pub struct TwilioAdapter(pub Arc<TwilioService>);

impl TwilioAdapter {
    pub fn new(service: Arc<TwilioService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseSmsService for TwilioAdapter {
    async fn send_sms(&self, from: &str, to: &str, body: &str) -> Result<String> {
        self.0
            .send_sms(from, to, body)
            .await
            .map(|message| message.sid)
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

// =============================================================================
// WatcherDeps
// =============================================================================

/// External services used by the watcher
#[derive(Clone)]
pub struct WatcherDeps {
    pub rules: Arc<dyn BaseRulesApi>,
    pub stream: Arc<dyn BaseStreamConnector>,
    pub sms: Arc<dyn BaseSmsService>,
}

impl WatcherDeps {
    pub fn new(
        rules: Arc<dyn BaseRulesApi>,
        stream: Arc<dyn BaseStreamConnector>,
        sms: Arc<dyn BaseSmsService>,
    ) -> Self {
        Self { rules, stream, sms }
    }

    /// Production wiring: Twitter for rules and stream, Twilio for SMS.
    pub fn from_config(config: &Config) -> Self {
        let twitter_client = TwitterClient::new(config.bearer_token.clone())
            .with_request_timeout(config.request_timeout);
        let twilio_service = TwilioService::new(TwilioOptions {
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
        })
        .with_request_timeout(config.request_timeout);

        let twitter = Arc::new(TwitterAdapter::new(Arc::new(twitter_client)));
        let twilio = Arc::new(TwilioAdapter::new(Arc::new(twilio_service)));

        Self {
            rules: twitter.clone(),
            stream: twitter,
            sms: twilio,
        }
    }
}
