//! Replaces the stream's active filter rules with the configured set.
//!
//! Runs once at startup, strictly in order: fetch, delete, create. Each step
//! is awaited before the next one starts and any failure aborts the sync.

use thiserror::Error;
use tracing::{info, warn};
use twitter_client::{Rule, RulesMutationResponse, RulesResponse, TwitterError};

use crate::kernel::BaseRulesApi;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to fetch active stream rules")]
    Fetch(#[source] TwitterError),

    #[error("failed to delete stream rules")]
    Delete(#[source] TwitterError),

    #[error("failed to create stream rules")]
    Create(#[source] TwitterError),
}

pub struct RuleSynchronizer<'a> {
    api: &'a dyn BaseRulesApi,
}

impl<'a> RuleSynchronizer<'a> {
    pub fn new(api: &'a dyn BaseRulesApi) -> Self {
        Self { api }
    }

    /// Make the active rule set equal `desired`.
    pub async fn synchronize(&self, desired: &[Rule]) -> Result<(), SyncError> {
        let current = self.fetch_active_rules().await?;
        self.delete_rules(&current).await?;
        self.create_rules(desired).await?;

        info!(count = desired.len(), "stream rules synchronized");
        Ok(())
    }

    pub async fn fetch_active_rules(&self) -> Result<RulesResponse, SyncError> {
        let current = self.api.get_rules().await.map_err(SyncError::Fetch)?;
        info!(count = current.ids().len(), "fetched active stream rules");
        Ok(current)
    }

    /// Delete every rule in `current`. An empty or unreadable listing is a no-op.
    /// Returns how many rules were sent for deletion.
    pub async fn delete_rules(&self, current: &RulesResponse) -> Result<usize, SyncError> {
        let ids = current.ids();
        if ids.is_empty() {
            info!("no active stream rules to delete");
            return Ok(0);
        }

        let response = self
            .api
            .delete_rules(&ids)
            .await
            .map_err(SyncError::Delete)?;

        let summary = response.summary();
        info!(requested = ids.len(), deleted = summary.deleted, "deleted stream rules");
        log_rule_errors(&response);
        Ok(ids.len())
    }

    pub async fn create_rules(&self, rules: &[Rule]) -> Result<(), SyncError> {
        let response = self
            .api
            .add_rules(rules)
            .await
            .map_err(SyncError::Create)?;

        let summary = response.summary();
        if summary.not_created > 0 {
            warn!(
                created = summary.created,
                not_created = summary.not_created,
                "some stream rules were not created"
            );
        } else {
            info!(count = rules.len(), "created stream rules");
        }
        log_rule_errors(&response);
        Ok(())
    }
}

fn log_rule_errors(response: &RulesMutationResponse) {
    for error in &response.errors {
        warn!(error = %error, "stream rules endpoint reported an error");
    }
}
