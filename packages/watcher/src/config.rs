use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use twitter_client::Rule;

use crate::domains::alerts::DEFAULT_TRIGGER_PHRASES;
use crate::domains::stream::{BackoffPolicy, SupervisorConfig, MAX_JITTER};

/// Accounts whose posts the stream delivers.
pub const DEFAULT_ACCOUNTS: &[&str] = &["coinbase", "coinbasepro"];

pub const ALERT_BODY: &str = "ALERT: New coin on Coinbase. https://www.coinbase.com";

/// Application configuration loaded from environment variables
#[derive(Clone)]
pub struct Config {
    pub bearer_token: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub from_phone: String,
    pub to_phone: String,
    /// Extra account to follow, handy for sending test posts
    pub test_account: Option<String>,
    pub rules: Vec<Rule>,
    pub trigger_phrases: Vec<String>,
    pub alert_body: String,
    pub stream_timeout: Duration,
    /// Deadline for rule and SMS requests, and for draining alerts on shutdown
    pub request_timeout: Duration,
    pub reconnect_base: Duration,
    pub reconnect_max: Duration,
    pub reconnect_jitter: f64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{} must be set", key))
        };

        let test_account = lookup("TEST_ACCT").filter(|v| !v.trim().is_empty());

        let stream_timeout_secs: u64 = lookup("STREAM_TIMEOUT_SECS")
            .unwrap_or_else(|| "20".to_string())
            .parse()
            .context("STREAM_TIMEOUT_SECS must be a valid number")?;
        let request_timeout_secs: u64 = lookup("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .context("REQUEST_TIMEOUT_SECS must be a valid number")?;
        let reconnect_base_ms: u64 = lookup("RECONNECT_BASE_MS")
            .unwrap_or_else(|| "1000".to_string())
            .parse()
            .context("RECONNECT_BASE_MS must be a valid number")?;
        let reconnect_max_ms: u64 = lookup("RECONNECT_MAX_MS")
            .unwrap_or_else(|| "60000".to_string())
            .parse()
            .context("RECONNECT_MAX_MS must be a valid number")?;
        let reconnect_jitter: f64 = lookup("RECONNECT_JITTER")
            .unwrap_or_else(|| "0.1".to_string())
            .parse()
            .context("RECONNECT_JITTER must be a valid number")?;

        anyhow::ensure!(stream_timeout_secs > 0, "STREAM_TIMEOUT_SECS must be positive");
        anyhow::ensure!(request_timeout_secs > 0, "REQUEST_TIMEOUT_SECS must be positive");
        anyhow::ensure!(
            reconnect_max_ms >= reconnect_base_ms,
            "RECONNECT_MAX_MS must not be smaller than RECONNECT_BASE_MS"
        );
        // Past one half a shaved delay can undercut the previous one
        anyhow::ensure!(
            (0.0..=MAX_JITTER).contains(&reconnect_jitter),
            "RECONNECT_JITTER must be between 0 and {}",
            MAX_JITTER
        );

        Ok(Self {
            bearer_token: required("BEARER_TOKEN")?,
            twilio_account_sid: required("TWILIO_ACCOUNT_SID")?,
            twilio_auth_token: required("TWILIO_AUTH_TOKEN")?,
            from_phone: required("FROM_PHONE")?,
            to_phone: required("TO_PHONE")?,
            rules: default_rules(test_account.as_deref()),
            test_account,
            trigger_phrases: DEFAULT_TRIGGER_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            alert_body: ALERT_BODY.to_string(),
            stream_timeout: Duration::from_secs(stream_timeout_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
            reconnect_base: Duration::from_millis(reconnect_base_ms),
            reconnect_max: Duration::from_millis(reconnect_max_ms),
            reconnect_jitter,
        })
    }

    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            idle_timeout: self.stream_timeout,
            drain_timeout: self.request_timeout,
            backoff: BackoffPolicy {
                base: self.reconnect_base,
                max: self.reconnect_max,
                jitter: self.reconnect_jitter,
            },
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bearer_token", &"<redacted>")
            .field("twilio_account_sid", &self.twilio_account_sid)
            .field("twilio_auth_token", &"<redacted>")
            .field("from_phone", &self.from_phone)
            .field("to_phone", &self.to_phone)
            .field("test_account", &self.test_account)
            .field("rules", &self.rules)
            .field("trigger_phrases", &self.trigger_phrases)
            .field("alert_body", &self.alert_body)
            .field("stream_timeout", &self.stream_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("reconnect_base", &self.reconnect_base)
            .field("reconnect_max", &self.reconnect_max)
            .field("reconnect_jitter", &self.reconnect_jitter)
            .finish()
    }
}

/// `from:<account>` rules for the default accounts plus the optional test account.
pub fn default_rules(test_account: Option<&str>) -> Vec<Rule> {
    DEFAULT_ACCOUNTS
        .iter()
        .copied()
        .chain(test_account)
        .map(|account| Rule::new(format!("from:{}", account)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("BEARER_TOKEN", "token"),
        ("TWILIO_ACCOUNT_SID", "AC123"),
        ("TWILIO_AUTH_TOKEN", "secret"),
        ("FROM_PHONE", "+15550000001"),
        ("TO_PHONE", "+15550000002"),
    ];

    #[test]
    fn loads_required_values_and_defaults() {
        let config = Config::from_lookup(lookup_from(REQUIRED)).unwrap();
        assert_eq!(config.bearer_token, "token");
        assert_eq!(config.to_phone, "+15550000002");
        assert_eq!(config.stream_timeout, Duration::from_secs(20));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.reconnect_base, Duration::from_secs(1));
        assert_eq!(config.reconnect_max, Duration::from_secs(60));
        assert_eq!(
            config.rules,
            vec![Rule::new("from:coinbase"), Rule::new("from:coinbasepro")]
        );
        assert_eq!(config.trigger_phrases.len(), DEFAULT_TRIGGER_PHRASES.len());
    }

    #[test]
    fn test_account_adds_rule() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("TEST_ACCT", "someone"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.rules.len(), 3);
        assert_eq!(config.rules[2], Rule::new("from:someone"));
    }

    #[test]
    fn missing_required_value_names_the_key() {
        let pairs: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != "TWILIO_AUTH_TOKEN")
            .collect();
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("TWILIO_AUTH_TOKEN must be set"));
    }

    #[test]
    fn rejects_inverted_backoff_bounds() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("RECONNECT_BASE_MS", "5000"));
        pairs.push(("RECONNECT_MAX_MS", "100"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn debug_output_redacts_credentials() {
        let config = Config::from_lookup(lookup_from(REQUIRED)).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("\"token\""));
        assert!(!printed.contains("secret"));
        assert!(printed.contains("AC123"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn rejects_jitter_that_could_shrink_delays() {
        for jitter in ["0.5", "0.9", "-0.1"] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push(("RECONNECT_JITTER", jitter));
            let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert!(err.to_string().contains("RECONNECT_JITTER"), "{}", jitter);
        }

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("RECONNECT_JITTER", "0.49"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.reconnect_jitter, 0.49);
    }
}
