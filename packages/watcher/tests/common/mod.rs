//! Shared helpers for watcher integration tests.

#![allow(dead_code)]

use twitter_client::{StreamEvent, StreamMessage};
use watcher_core::Config;

/// Config with fixed credentials, a 20s idle timeout, 1s..60s backoff and no jitter.
pub fn test_config() -> Config {
    Config::from_lookup(|key| {
        let value = match key {
            "BEARER_TOKEN" => "test-bearer",
            "TWILIO_ACCOUNT_SID" => "AC00000000000000000000000000000000",
            "TWILIO_AUTH_TOKEN" => "test-auth",
            "FROM_PHONE" => "+15550000001",
            "TO_PHONE" => "+15550000002",
            "RECONNECT_JITTER" => "0",
            _ => return None,
        };
        Some(value.to_string())
    })
    .expect("test config should load")
}

pub fn event(json: &str) -> StreamEvent {
    serde_json::from_str(json).expect("test event should decode")
}

pub fn post(text: &str) -> StreamMessage {
    let json = serde_json::json!({ "data": { "id": "1", "text": text } });
    StreamMessage::Post(Box::new(serde_json::from_value(json).expect("post should decode")))
}
