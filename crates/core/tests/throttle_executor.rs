//! Backoff behaviour of the throttle-aware executor under a paused clock

mod support;

use std::time::Duration;

use oshub_core::ports::ApiRequest;
use oshub_core::throttle::{Completion, ThrottleExecutor};
use oshub_domain::OshError;
use serde_json::json;
use support::transport::MockTransport;
use tokio::time::Instant;

fn assert_elapsed(start: Instant, expected_secs: u64) {
    let elapsed = start.elapsed();
    let expected = Duration::from_secs(expected_secs);
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(100),
        "expected ~{expected:?}, slept {elapsed:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn retries_after_advertised_wait_then_succeeds() {
    let transport = MockTransport::new().throttled(2).reply(200, json!({"status": "MATCHED"}));
    let executor = ThrottleExecutor::new(transport.shared(), 10.0).unwrap();

    let start = Instant::now();
    let response = executor.execute(&ApiRequest::get("/api/sectors/")).await.unwrap();

    assert_eq!(response.completion, Completion::Success);
    assert_eq!(response.body["status"], "MATCHED");
    assert_eq!(transport.request_count(), 2);
    assert_elapsed(start, 2);
}

#[tokio::test(start_paused = true)]
async fn times_out_when_next_wait_exceeds_remaining_budget() {
    let transport = MockTransport::new().throttled(4).throttled(4).throttled(4);
    let executor = ThrottleExecutor::new(transport.shared(), 10.0).unwrap();

    let start = Instant::now();
    let err = executor.execute(&ApiRequest::get("/api/sectors/")).await.unwrap_err();

    assert_eq!(err, OshError::ThrottledTimeout { budget_secs: 10.0 });
    assert_eq!(transport.request_count(), 3, "third wait of 4s exceeds the 2s left");
    assert_elapsed(start, 8);
}

#[tokio::test(start_paused = true)]
async fn wait_longer_than_budget_times_out_without_sleeping() {
    let transport = MockTransport::new().throttled(12).reply(200, json!({}));
    let executor = ThrottleExecutor::new(transport.shared(), 5.0).unwrap();

    let start = Instant::now();
    let err = executor.execute(&ApiRequest::get("/api/sectors/")).await.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(transport.request_count(), 1);
    assert_eq!(transport.remaining_replies(), 1);
    assert_elapsed(start, 0);
}

#[tokio::test(start_paused = true)]
async fn exactly_spent_budget_still_retries_once() {
    let transport = MockTransport::new().throttled(4).reply(201, json!({"os_id": "US1"}));
    let executor = ThrottleExecutor::new(transport.shared(), 4.0).unwrap();

    let response = executor.execute(&ApiRequest::post("/api/facilities/", None)).await.unwrap();
    assert_eq!(response.completion, Completion::Created);

    let transport = MockTransport::new().throttled(4).throttled(4);
    let executor = ThrottleExecutor::new(transport.shared(), 4.0).unwrap();

    let start = Instant::now();
    assert!(executor.execute(&ApiRequest::get("/api/sectors/")).await.unwrap_err().is_timeout());
    assert_eq!(transport.request_count(), 2);
    assert_elapsed(start, 4);
}

#[tokio::test(start_paused = true)]
async fn unparseable_throttle_body_uses_fallback_delay() {
    let transport = MockTransport::new()
        .reply(429, json!({"detail": "Slow down"}))
        .reply(429, json!(null))
        .reply(201, json!({}));
    let executor = ThrottleExecutor::new(transport.shared(), 10.0).unwrap();

    let start = Instant::now();
    let response = executor.execute(&ApiRequest::get("/api/sectors/")).await.unwrap();

    assert_eq!(response.completion, Completion::Created);
    assert_elapsed(start, 2);
}

#[tokio::test(start_paused = true)]
async fn fallback_delay_is_charged_to_budget() {
    let transport = MockTransport::new()
        .reply(429, json!({}))
        .reply(429, json!({}))
        .reply(429, json!({}));
    let executor = ThrottleExecutor::new(transport.shared(), 2.0).unwrap();

    assert!(executor.execute(&ApiRequest::get("/")).await.unwrap_err().is_timeout());
    assert_eq!(transport.request_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn transport_errors_are_not_retried() {
    let transport = MockTransport::new().fail("connection refused").reply(200, json!({}));
    let executor = ThrottleExecutor::new(transport.shared(), 10.0).unwrap();

    let err = executor.execute(&ApiRequest::get("/")).await.unwrap_err();

    assert_eq!(err, OshError::Transport("connection refused".into()));
    assert_eq!(transport.request_count(), 1);
    assert_eq!(transport.remaining_replies(), 1);
}

#[tokio::test(start_paused = true)]
async fn other_statuses_are_remote_errors_without_retry() {
    let transport = MockTransport::new()
        .reply(500, json!({"detail": "Server Error"}))
        .reply(200, json!({}));
    let executor = ThrottleExecutor::new(transport.shared(), 10.0).unwrap();

    let err = executor.execute(&ApiRequest::get("/")).await.unwrap_err();

    assert_eq!(err, OshError::Remote { status: 500, detail: "Server Error".into() });
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn zero_budget_never_sleeps() {
    let transport = MockTransport::new().throttled(1);
    let executor = ThrottleExecutor::new(transport.shared(), 0.0).unwrap();

    let start = Instant::now();
    assert!(executor.execute(&ApiRequest::get("/")).await.unwrap_err().is_timeout());
    assert_elapsed(start, 0);
}

#[tokio::test(start_paused = true)]
async fn wait_beyond_representable_duration_times_out() {
    let transport = MockTransport::new().reply(
        429,
        json!({"detail": "Request was throttled. Expected available in 99999999999999999999999 seconds."}),
    );
    let executor = ThrottleExecutor::new(transport.shared(), f64::MAX).unwrap();

    let start = Instant::now();
    let err = executor.execute(&ApiRequest::get("/api/sectors/")).await.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(transport.request_count(), 1);
    assert_elapsed(start, 0);
}
