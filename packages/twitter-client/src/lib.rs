//! Pure Twitter v2 filtered-stream client.
//!
//! Covers the two endpoints a filtered-stream consumer needs: rule
//! management (list, bulk delete, bulk add) and the long-lived stream itself.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use twitter_client::{Rule, StreamMessage, TwitterClient};
//!
//! let client = TwitterClient::new("bearer-token".into());
//!
//! client.add_rules(&[Rule::new("from:coinbase")]).await?;
//!
//! let mut stream = client.connect_stream().await?;
//! while let Some(item) = stream.next().await {
//!     if let StreamMessage::Post(event) = item? {
//!         println!("{}", event.text().unwrap_or_default());
//!     }
//! }
//! ```

pub mod error;
pub mod streaming;
pub mod types;

pub use error::{Result, TwitterError};
pub use streaming::{StreamMessage, TweetStream, DEFAULT_MAX_LINE_BYTES};
pub use types::{
    ActiveRule, Post, Rule, RulesMeta, RulesMutationResponse, RulesResponse, RulesSummary,
    StreamEvent,
};

use std::time::Duration;

use reqwest::StatusCode;
use types::{AddRulesRequest, DeleteIds, DeleteRulesRequest};

const BASE_URL: &str = "https://api.twitter.com/2";

/// Deadline for each rules request. The stream request has none; its
/// liveness is the caller's idle timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct TwitterClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
    request_timeout: Duration,
}

impl std::fmt::Debug for TwitterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterClient")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl TwitterClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn rules_url(&self) -> String {
        format!("{}/tweets/search/stream/rules", self.base_url)
    }

    pub fn stream_url(&self) -> String {
        format!("{}/tweets/search/stream", self.base_url)
    }

    /// List the rules currently installed on the stream. Expects HTTP 200.
    pub async fn get_rules(&self) -> Result<RulesResponse> {
        let resp = self
            .client
            .get(self.rules_url())
            .bearer_auth(&self.token)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let resp = expect_status(resp, StatusCode::OK).await?;
        resp.json::<RulesResponse>()
            .await
            .map_err(|e| TwitterError::Parse(e.to_string()))
    }

    /// Bulk-delete rules by id. Expects HTTP 200.
    pub async fn delete_rules(&self, ids: &[String]) -> Result<RulesMutationResponse> {
        let body = DeleteRulesRequest {
            delete: DeleteIds { ids },
        };
        let resp = self
            .client
            .post(self.rules_url())
            .bearer_auth(&self.token)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await?;

        let resp = expect_status(resp, StatusCode::OK).await?;
        resp.json::<RulesMutationResponse>()
            .await
            .map_err(|e| TwitterError::Parse(e.to_string()))
    }

    /// Bulk-add rules. Expects HTTP 201.
    pub async fn add_rules(&self, rules: &[Rule]) -> Result<RulesMutationResponse> {
        let body = AddRulesRequest { add: rules };
        let resp = self
            .client
            .post(self.rules_url())
            .bearer_auth(&self.token)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await?;

        let resp = expect_status(resp, StatusCode::CREATED).await?;
        resp.json::<RulesMutationResponse>()
            .await
            .map_err(|e| TwitterError::Parse(e.to_string()))
    }

    /// Open the filtered stream. Resolves once response headers arrive;
    /// the returned stream then yields one item per line of the body.
    pub async fn connect_stream(&self) -> Result<TweetStream> {
        let resp = self
            .client
            .get(self.stream_url())
            .bearer_auth(&self.token)
            .send()
            .await?;

        let resp = expect_status(resp, StatusCode::OK).await?;
        tracing::debug!(url = %self.stream_url(), "stream connected");
        Ok(TweetStream::new(resp.bytes_stream()))
    }
}

async fn expect_status(resp: reqwest::Response, expected: StatusCode) -> Result<reqwest::Response> {
    let status = resp.status();
    if status != expected {
        let body = resp.text().await.unwrap_or_default();
        return Err(TwitterError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}
