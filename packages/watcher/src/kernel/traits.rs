// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Naming convention: Base* for trait names (e.g., BaseRulesApi, BaseSmsService)

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use twitter_client::{Rule, RulesMutationResponse, RulesResponse, StreamMessage};

// =============================================================================
// Stream Rules Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseRulesApi: Send + Sync {
    /// List rules currently installed on the stream (HTTP 200 only)
    async fn get_rules(&self) -> twitter_client::Result<RulesResponse>;

    /// Bulk-delete rules by id (HTTP 200 only)
    async fn delete_rules(&self, ids: &[String]) -> twitter_client::Result<RulesMutationResponse>;

    /// Bulk-add rules (HTTP 201 only)
    async fn add_rules(&self, rules: &[Rule]) -> twitter_client::Result<RulesMutationResponse>;
}

// =============================================================================
// Stream Connector Trait (Infrastructure)
// =============================================================================

/// Decoded lines of one open stream connection. Dropping it closes the connection.
pub type EventStream = BoxStream<'static, twitter_client::Result<StreamMessage>>;

#[async_trait]
pub trait BaseStreamConnector: Send + Sync {
    /// Open a new stream connection
    async fn connect(&self) -> twitter_client::Result<EventStream>;
}

// =============================================================================
// SMS Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseSmsService: Send + Sync {
    /// Send one SMS, returning the provider's message id
    async fn send_sms(&self, from: &str, to: &str, body: &str) -> Result<String>;
}
