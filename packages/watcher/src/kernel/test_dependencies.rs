// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into WatcherDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use twitter_client::{
    ActiveRule, Rule, RulesMutationResponse, RulesResponse, StreamMessage, TweetStream,
    TwitterError,
};

use super::{BaseRulesApi, BaseSmsService, BaseStreamConnector, EventStream, WatcherDeps};

// =============================================================================
// Mock Rules API
// =============================================================================

/// A call made against the rules endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulesCall {
    Get,
    Delete(Vec<String>),
    Add(Vec<Rule>),
}

/// In-memory stand-in for the rules endpoint. Keeps an active rule set so
/// tests can check what is installed after a sync.
pub struct MockRulesApi {
    active: Arc<Mutex<Vec<ActiveRule>>>,
    next_id: Arc<Mutex<u64>>,
    get_failure: Option<(u16, String)>,
    delete_failure: Option<(u16, String)>,
    add_failure: Option<(u16, String)>,
    calls: Arc<Mutex<Vec<RulesCall>>>,
}

impl MockRulesApi {
    pub fn new() -> Self {
        Self {
            active: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(Mutex::new(1)),
            get_failure: None,
            delete_failure: None,
            add_failure: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Pre-install rules on the fake service
    pub fn with_active_rules(self, values: &[&str]) -> Self {
        {
            let mut active = self.active.lock().unwrap();
            let mut next_id = self.next_id.lock().unwrap();
            for value in values {
                active.push(ActiveRule {
                    id: next_id.to_string(),
                    value: value.to_string(),
                    tag: None,
                });
                *next_id += 1;
            }
        }
        self
    }

    pub fn with_get_failure(mut self, status: u16, body: &str) -> Self {
        self.get_failure = Some((status, body.to_string()));
        self
    }

    pub fn with_delete_failure(mut self, status: u16, body: &str) -> Self {
        self.delete_failure = Some((status, body.to_string()));
        self
    }

    pub fn with_add_failure(mut self, status: u16, body: &str) -> Self {
        self.add_failure = Some((status, body.to_string()));
        self
    }

    /// Get all calls in order
    pub fn calls(&self) -> Vec<RulesCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Values of the rules currently installed
    pub fn active_values(&self) -> Vec<String> {
        self.active
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.value.clone())
            .collect()
    }

    fn record(&self, call: RulesCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Default for MockRulesApi {
    fn default() -> Self {
        Self::new()
    }
}

fn api_error(failure: &(u16, String)) -> TwitterError {
    TwitterError::Api {
        status: failure.0,
        body: failure.1.clone(),
    }
}

#[async_trait]
impl BaseRulesApi for MockRulesApi {
    async fn get_rules(&self) -> twitter_client::Result<RulesResponse> {
        self.record(RulesCall::Get);
        if let Some(failure) = &self.get_failure {
            return Err(api_error(failure));
        }

        let active = self.active.lock().unwrap().clone();
        Ok(RulesResponse {
            data: if active.is_empty() { None } else { Some(active) },
            meta: None,
        })
    }

    async fn delete_rules(&self, ids: &[String]) -> twitter_client::Result<RulesMutationResponse> {
        self.record(RulesCall::Delete(ids.to_vec()));
        if let Some(failure) = &self.delete_failure {
            return Err(api_error(failure));
        }

        self.active
            .lock()
            .unwrap()
            .retain(|rule| !ids.contains(&rule.id));
        Ok(RulesMutationResponse::default())
    }

    async fn add_rules(&self, rules: &[Rule]) -> twitter_client::Result<RulesMutationResponse> {
        self.record(RulesCall::Add(rules.to_vec()));
        if let Some(failure) = &self.add_failure {
            return Err(api_error(failure));
        }

        let mut active = self.active.lock().unwrap();
        let mut next_id = self.next_id.lock().unwrap();
        for rule in rules {
            active.push(ActiveRule {
                id: next_id.to_string(),
                value: rule.value.clone(),
                tag: rule.tag.clone(),
            });
            *next_id += 1;
        }
        Ok(RulesMutationResponse::default())
    }
}

// =============================================================================
// Mock Stream Connector
// =============================================================================

/// What a scripted connection does once opened
pub enum ScriptedConnection {
    /// Opening fails with this error
    Refuse(TwitterError),
    /// Yields the messages, then the server closes the body
    Messages(Vec<StreamMessage>),
    /// Yields the messages, then goes silent forever
    MessagesThenStall(Vec<StreamMessage>),
    /// Raw body chunks run through the real line parser, then silence
    RawThenStall(Vec<String>),
    /// Yields the messages, then a transport error
    MessagesThenError(Vec<StreamMessage>, TwitterError),
}

/// Stream connector that plays back one script per `connect` call.
///
/// Once the scripts run out, `connect` cancels the attached shutdown token (if
/// any) and hands back a connection that never produces anything.
pub struct MockStreamConnector {
    scripts: Arc<Mutex<VecDeque<ScriptedConnection>>>,
    connects: Arc<Mutex<Vec<Instant>>>,
    shutdown_when_exhausted: Option<CancellationToken>,
}

impl MockStreamConnector {
    pub fn new() -> Self {
        Self {
            scripts: Arc::new(Mutex::new(VecDeque::new())),
            connects: Arc::new(Mutex::new(Vec::new())),
            shutdown_when_exhausted: None,
        }
    }

    pub fn with_connection(self, script: ScriptedConnection) -> Self {
        self.scripts.lock().unwrap().push_back(script);
        self
    }

    pub fn with_shutdown_when_exhausted(mut self, token: CancellationToken) -> Self {
        self.shutdown_when_exhausted = Some(token);
        self
    }

    /// Number of connection attempts so far
    pub fn connect_count(&self) -> usize {
        self.connects.lock().unwrap().len()
    }

    /// (Paused-clock) instants at which each connection attempt started
    pub fn connect_times(&self) -> Vec<Instant> {
        self.connects.lock().unwrap().clone()
    }
}

impl Default for MockStreamConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseStreamConnector for MockStreamConnector {
    async fn connect(&self) -> twitter_client::Result<EventStream> {
        self.connects.lock().unwrap().push(Instant::now());

        let script = self.scripts.lock().unwrap().pop_front();
        let Some(script) = script else {
            if let Some(token) = &self.shutdown_when_exhausted {
                token.cancel();
            }
            return Ok(futures::stream::pending::<twitter_client::Result<StreamMessage>>().boxed());
        };

        let stream: EventStream = match script {
            ScriptedConnection::Refuse(err) => return Err(err),
            ScriptedConnection::Messages(messages) => {
                futures::stream::iter(messages.into_iter().map(Ok)).boxed()
            }
            ScriptedConnection::MessagesThenStall(messages) => {
                futures::stream::iter(messages.into_iter().map(Ok))
                    .chain(futures::stream::pending())
                    .boxed()
            }
            ScriptedConnection::RawThenStall(chunks) => {
                let bytes = chunks
                    .into_iter()
                    .map(|chunk| Ok::<_, Infallible>(Bytes::from(chunk)));
                TweetStream::new(futures::stream::iter(bytes))
                    .chain(futures::stream::pending())
                    .boxed()
            }
            ScriptedConnection::MessagesThenError(messages, err) => {
                futures::stream::iter(messages.into_iter().map(Ok))
                    .chain(futures::stream::once(async move { Err(err) }))
                    .boxed()
            }
        };
        Ok(stream)
    }
}

// =============================================================================
// Mock SMS Service
// =============================================================================

/// Arguments captured from a send call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsCall {
    pub from: String,
    pub to: String,
    pub body: String,
}

pub struct MockSmsService {
    calls: Arc<Mutex<Vec<SmsCall>>>,
    failure: Option<String>,
    hang: bool,
}

impl MockSmsService {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failure: None,
            hang: false,
        }
    }

    /// Every send fails with this message (the call is still recorded)
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }

    /// Every send is recorded and then never completes
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<SmsCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockSmsService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseSmsService for MockSmsService {
    async fn send_sms(&self, from: &str, to: &str, body: &str) -> Result<String> {
        let sid = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(SmsCall {
                from: from.to_string(),
                to: to.to_string(),
                body: body.to_string(),
            });
            format!("SM{:032}", calls.len())
        };

        if self.hang {
            futures::future::pending::<()>().await;
        }

        match &self.failure {
            Some(message) => Err(anyhow::anyhow!("{}", message)),
            None => Ok(sid),
        }
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Bundle of mocks, kept around so tests can inspect them after a run
pub struct TestDependencies {
    pub rules: Arc<MockRulesApi>,
    pub stream: Arc<MockStreamConnector>,
    pub sms: Arc<MockSmsService>,
}

impl TestDependencies {
    pub fn new(rules: MockRulesApi, stream: MockStreamConnector, sms: MockSmsService) -> Self {
        Self {
            rules: Arc::new(rules),
            stream: Arc::new(stream),
            sms: Arc::new(sms),
        }
    }

    pub fn deps(&self) -> WatcherDeps {
        WatcherDeps::new(self.rules.clone(), self.stream.clone(), self.sms.clone())
    }
}
