//! Stream supervisor behavior against scripted connections.
//!
//! These run on a paused clock: sleeps and idle timeouts complete instantly,
//! but `Instant` differences still reflect the scheduled durations.

mod common;

use std::time::Duration;

use common::{post, test_config};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use twitter_client::{StreamMessage, TwitterError};
use watcher_core::domains::alerts::AlertDispatcher;
use watcher_core::domains::stream::StreamSupervisor;
use watcher_core::kernel::{
    MockRulesApi, MockSmsService, MockStreamConnector, ScriptedConnection, TestDependencies,
};
use watcher_core::ALERT_BODY;

const IDLE: Duration = Duration::from_secs(20);

fn supervisor(deps: &TestDependencies, phrases: &[&str]) -> StreamSupervisor {
    let config = test_config();
    StreamSupervisor::new(
        deps.stream.clone(),
        phrases.iter().map(|p| p.to_string()).collect(),
        AlertDispatcher::from_config(deps.sms.clone(), &config),
        config.supervisor_config(),
    )
}

fn gaps(times: &[Instant]) -> Vec<Duration> {
    times.windows(2).map(|w| w[1] - w[0]).collect()
}

fn assert_durations(actual: &[Duration], expected_secs: &[u64]) {
    assert_eq!(actual.len(), expected_secs.len(), "actual: {:?}", actual);
    for (actual, expected) in actual.iter().zip(expected_secs) {
        let expected = Duration::from_secs(*expected);
        assert!(
            *actual >= expected && *actual <= expected + Duration::from_millis(5),
            "expected ~{:?}, got {:?}",
            expected,
            actual
        );
    }
}

fn stall() -> ScriptedConnection {
    ScriptedConnection::MessagesThenStall(vec![])
}

#[tokio::test(start_paused = true)]
async fn backoff_grows_over_stalled_connections_and_resets_after_healthy_one() {
    let shutdown = CancellationToken::new();
    let stream = MockStreamConnector::new()
        .with_connection(stall())
        .with_connection(stall())
        .with_connection(stall())
        .with_connection(ScriptedConnection::MessagesThenStall(vec![
            StreamMessage::KeepAlive,
        ]))
        .with_connection(stall())
        .with_shutdown_when_exhausted(shutdown.clone());
    let deps = TestDependencies::new(MockRulesApi::new(), stream, MockSmsService::new());

    supervisor(&deps, &["is now live at"]).run(shutdown).await;

    // One connect per failure plus the final one that exhausts the script
    assert_eq!(deps.stream.connect_count(), 6);

    let reconnect_delays: Vec<Duration> = gaps(&deps.stream.connect_times())
        .into_iter()
        .map(|gap| gap - IDLE)
        .collect();
    assert_durations(&reconnect_delays, &[1, 2, 4, 1, 2]);
}

#[tokio::test(start_paused = true)]
async fn non_timeout_failures_are_retried_too() {
    let shutdown = CancellationToken::new();
    let stream = MockStreamConnector::new()
        .with_connection(ScriptedConnection::Refuse(TwitterError::Api {
            status: 503,
            body: "Service Unavailable".to_string(),
        }))
        .with_connection(ScriptedConnection::MessagesThenError(
            vec![StreamMessage::KeepAlive],
            TwitterError::Parse("connection reset".to_string()),
        ))
        .with_connection(ScriptedConnection::Messages(vec![StreamMessage::KeepAlive]))
        .with_shutdown_when_exhausted(shutdown.clone());
    let deps = TestDependencies::new(MockRulesApi::new(), stream, MockSmsService::new());

    supervisor(&deps, &["is now live at"]).run(shutdown).await;

    assert_eq!(deps.stream.connect_count(), 4);
    // Connections two and three were healthy, so every delay is the base delay
    assert_durations(&gaps(&deps.stream.connect_times()), &[1, 1, 1]);
}

#[tokio::test(start_paused = true)]
async fn matching_post_dispatches_exactly_once() {
    let shutdown = CancellationToken::new();
    let stream = MockStreamConnector::new()
        .with_connection(ScriptedConnection::RawThenStall(vec![
            "{\"data\":{\"id\":\"1\",\"text\":\"XRP is now live at Coinbase\"}}\r\n".to_string(),
        ]))
        .with_shutdown_when_exhausted(shutdown.clone());
    let deps = TestDependencies::new(MockRulesApi::new(), stream, MockSmsService::new());

    supervisor(&deps, &["is now live at"]).run(shutdown).await;

    let calls = deps.sms.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].from, "+15550000001");
    assert_eq!(calls[0].to, "+15550000002");
    assert_eq!(calls[0].body, ALERT_BODY);
}

#[tokio::test(start_paused = true)]
async fn undecodable_lines_and_keep_alives_never_dispatch_or_end_the_read_loop() {
    let shutdown = CancellationToken::new();
    let stream = MockStreamConnector::new()
        .with_connection(ScriptedConnection::RawThenStall(vec![
            "not json at all\n".to_string(),
            "\r\n".to_string(),
            String::new(),
            "{\"data\":{\"text\":\"unrelated post\"}}\n".to_string(),
            "{\"data\":{\"text\":\"XRP is now live at Coinbase\"}}\n".to_string(),
        ]))
        .with_shutdown_when_exhausted(shutdown.clone());
    let deps = TestDependencies::new(MockRulesApi::new(), stream, MockSmsService::new());

    supervisor(&deps, &["is now live at"]).run(shutdown).await;

    // The match after the garbage was still read on the first connection
    assert_eq!(deps.sms.calls().len(), 1);
    assert_eq!(deps.stream.connect_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn keep_alive_only_stream_sends_nothing() {
    let shutdown = CancellationToken::new();
    let stream = MockStreamConnector::new()
        .with_connection(ScriptedConnection::RawThenStall(vec![
            String::new(),
            "\r\n".to_string(),
            "\r\n".to_string(),
        ]))
        .with_shutdown_when_exhausted(shutdown.clone());
    let deps = TestDependencies::new(MockRulesApi::new(), stream, MockSmsService::new());

    supervisor(&deps, &["is now live at"]).run(shutdown).await;

    assert!(deps.sms.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_alert_does_not_stop_the_stream() {
    let shutdown = CancellationToken::new();
    let stream = MockStreamConnector::new()
        .with_connection(ScriptedConnection::MessagesThenStall(vec![
            post("ETH is now live at Coinbase"),
            post("nothing to see"),
            post("SOL is now live at Coinbase"),
        ]))
        .with_shutdown_when_exhausted(shutdown.clone());
    let deps = TestDependencies::new(
        MockRulesApi::new(),
        stream,
        MockSmsService::failing("quota exceeded"),
    );

    supervisor(&deps, &["is now live at"]).run(shutdown).await;

    assert_eq!(deps.sms.calls().len(), 2);
    assert_eq!(deps.stream.connect_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_an_open_stream_without_reconnecting() {
    let shutdown = CancellationToken::new();
    let stream = MockStreamConnector::new().with_connection(ScriptedConnection::MessagesThenStall(
        vec![post("hello"), StreamMessage::KeepAlive],
    ));
    let deps = TestDependencies::new(MockRulesApi::new(), stream, MockSmsService::new());

    let supervisor = supervisor(&deps, &["is now live at"]);
    let token = shutdown.clone();
    let handle = tokio::spawn(async move { supervisor.run(token).await });

    tokio::time::sleep(Duration::from_secs(5)).await;
    shutdown.cancel();
    handle.await.unwrap();

    assert_eq!(deps.stream.connect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_during_backoff_skips_the_pending_reconnect() {
    let shutdown = CancellationToken::new();
    let stream = MockStreamConnector::new()
        .with_connection(stall())
        .with_connection(stall())
        .with_connection(stall());
    let deps = TestDependencies::new(MockRulesApi::new(), stream, MockSmsService::new());

    let supervisor = supervisor(&deps, &["is now live at"]);
    let token = shutdown.clone();
    let handle = tokio::spawn(async move { supervisor.run(token).await });

    // First connection times out at 20s, then a 1s backoff starts
    tokio::time::sleep(IDLE + Duration::from_millis(500)).await;
    shutdown.cancel();
    handle.await.unwrap();

    assert_eq!(deps.stream.connect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_gives_up_on_an_alert_that_never_completes() {
    let shutdown = CancellationToken::new();
    let stream = MockStreamConnector::new()
        .with_connection(ScriptedConnection::MessagesThenStall(vec![post(
            "XRP is now live at Coinbase",
        )]));
    let deps = TestDependencies::new(MockRulesApi::new(), stream, MockSmsService::hanging());

    let config = test_config();
    let supervisor = supervisor(&deps, &["is now live at"]);
    let token = shutdown.clone();
    let handle = tokio::spawn(async move { supervisor.run(token).await });

    tokio::time::sleep(Duration::from_secs(5)).await;
    shutdown.cancel();
    let stopped_at = Instant::now();
    handle.await.unwrap();

    // Returns once the drain deadline passes
    assert_eq!(deps.sms.calls().len(), 1);
    assert!(Instant::now() - stopped_at >= config.request_timeout);
    assert_eq!(deps.stream.connect_count(), 1);
}
