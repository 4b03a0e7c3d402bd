// Minimal Twilio REST client: sends a single SMS through the Messages resource.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

pub mod error;
pub mod models;

use reqwest::Client;

pub use crate::error::{Result, TwilioError};
use crate::models::{ApiErrorResponse, MessageResponse};

const BASE_URL: &str = "https://api.twilio.com/2010-04-01";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
}

impl fmt::Debug for TwilioOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioOptions")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct TwilioService {
    options: TwilioOptions,
    base_url: String,
    client: Client,
    request_timeout: Duration,
}

impl TwilioService {
    pub fn new(options: TwilioOptions) -> Self {
        Self {
            options,
            base_url: BASE_URL.to_string(),
            client: Client::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Deadline for each send, covering connect through reading the response.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Point the client at a different API root (sandboxes, local fakes).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// URL of the Messages list resource for the configured account.
    pub fn messages_url(&self) -> String {
        format!(
            "{base}/Accounts/{sid}/Messages.json",
            base = self.base_url,
            sid = self.options.account_sid
        )
    }

    /// Send one SMS. Returns the created message resource; its `sid` identifies the delivery.
    pub async fn send_sms(&self, from: &str, to: &str, body: &str) -> Result<MessageResponse> {
        let mut form_body: HashMap<&str, &str> = HashMap::new();
        form_body.insert("Body", body);
        form_body.insert("From", from);
        form_body.insert("To", to);

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .form(&form_body)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = %error_body, "Twilio rejected message");
            return Err(TwilioError::Api {
                status: status.as_u16(),
                message: ApiErrorResponse::message_from_body(&error_body),
            });
        }

        response
            .json::<MessageResponse>()
            .await
            .map_err(|e| TwilioError::Parse(e.to_string()))
    }
}
