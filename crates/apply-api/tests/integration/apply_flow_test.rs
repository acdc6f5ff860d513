//! Apply flow end-to-end tests against a running `apply-api` server.
//!
//! Requires:
//! - A running `apply-api` at APPLY_API_URL (default: http://localhost:8000)
//! - APPLY_TEST_JOB_KEY: job_key for a job row that exists and has not been
//!   applied to. The Orchestrator/Worker unit tests in `orchestrator.rs`
//!   already cover the serialization-lease, confirmation-gate, and dedup
//!   logic against fake ports in isolation; these tests only check that the
//!   HTTP surface wires requests/responses to that logic correctly.
//! - APPLY_TEST_APPLIED_JOB_KEY: job_key for a job row whose status is
//!   already in the applied set (`applied`, `phone_screen`, ...).
//!
//! All tests are `#[ignore]`d by default; run with `cargo test -- --ignored`
//! against a server wired to a seeded database.

use serde::{Deserialize, Serialize};
use std::time::Duration;

struct TestClient {
    http: reqwest::Client,
    base_url: String,
}

impl TestClient {
    fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: std::env::var("APPLY_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Serialize, Default)]
struct TriggerApplyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApplySessionResponse {
    #[allow(dead_code)]
    session_id: String,
    job_key: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[allow(dead_code)]
    error: String,
    code: u16,
}

fn job_key_env(var: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| panic!("{var} must be set for this test"))
}

/// Scenario 1: happy path. Triggering apply for a fresh job_key starts a
/// Session and returns `status: "started"`.
#[tokio::test]
#[ignore] // requires a running apply-api server and a seeded job row
async fn test_apply_happy_path_starts_session() {
    let client = TestClient::new();
    let job_key = job_key_env("APPLY_TEST_JOB_KEY");

    let resp = client
        .http
        .post(client.url(&format!("/jobs/{job_key}/apply")))
        .json(&TriggerApplyRequest::default())
        .send()
        .await
        .expect("trigger apply request failed");

    assert!(
        resp.status().is_success(),
        "expected 200, got {}: {}",
        resp.status(),
        resp.text().await.unwrap_or_default()
    );

    let body: ApplySessionResponse = resp.json().await.expect("failed to parse response");
    assert_eq!(body.job_key, job_key);
    assert_eq!(body.status, "started");
}

/// Scenario 2: already-applied short-circuit. A job already in the applied
/// set surfaces an error event immediately, followed by done, over SSE.
#[tokio::test]
#[ignore] // requires a running apply-api server and a seeded applied job row
async fn test_apply_already_applied_short_circuits() {
    let client = TestClient::new();
    let job_key = job_key_env("APPLY_TEST_APPLIED_JOB_KEY");

    let resp = client
        .http
        .post(client.url(&format!("/jobs/{job_key}/apply")))
        .json(&TriggerApplyRequest::default())
        .send()
        .await
        .expect("trigger apply request failed");
    assert!(resp.status().is_success());
    let started: ApplySessionResponse = resp.json().await.expect("failed to parse response");

    let stream_resp = client
        .http
        .get(client.url(&format!("/jobs/{job_key}/apply/stream")))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("stream request failed");
    assert!(stream_resp.status().is_success());

    let body = stream_resp.text().await.expect("failed to read SSE body");
    assert!(
        body.contains("\"type\":\"error\"") || body.contains("event: error"),
        "expected an error event in the stream for an already-applied job: {body}"
    );
    assert!(
        body.contains("\"type\":\"done\"") || body.contains("event: done"),
        "expected a terminal done event: {body}"
    );
    assert_eq!(started.job_key, job_key);
}

/// Scenario 3 (confirmation timeout) and 4 (cancellation mid-wait) are
/// exercised with `tokio::time::pause()` against fake ports in
/// `orchestrator.rs`'s own unit tests, since they require controlling wall
/// clock time precisely; that is impractical against a live server.
///
/// Here we only check that `confirm`/`cancel` against a job_key with no
/// active Session fails cleanly with 404, rather than hanging or panicking.
#[tokio::test]
#[ignore] // requires a running apply-api server
async fn test_confirm_unknown_session_returns_not_found() {
    let client = TestClient::new();
    let job_key = format!("no-such-session-{}", ulid::Ulid::new());

    let resp = client
        .http
        .post(client.url(&format!("/jobs/{job_key}/apply/confirm")))
        .send()
        .await
        .expect("confirm request failed");

    assert_eq!(resp.status().as_u16(), 404);
    let error: ErrorResponse = resp.json().await.expect("failed to parse error body");
    assert_eq!(error.code, 404);
}

/// Scenario 6: starting the same job_key twice while the first Session is
/// still live returns the same Session rather than launching a second
/// Worker (idempotent guard, §4.1). The first call is awaited to
/// completion before the second fires, so the registration race is
/// deterministic rather than dependent on network interleaving.
#[tokio::test]
#[ignore] // requires a running apply-api server and a seeded job row
async fn test_second_apply_for_same_job_key_is_idempotent() {
    let client = TestClient::new();
    let job_key = job_key_env("APPLY_TEST_JOB_KEY");

    let first: ApplySessionResponse = client
        .http
        .post(client.url(&format!("/jobs/{job_key}/apply")))
        .json(&TriggerApplyRequest::default())
        .send()
        .await
        .expect("first trigger failed")
        .json()
        .await
        .expect("failed to parse first response");

    let second: ApplySessionResponse = client
        .http
        .post(client.url(&format!("/jobs/{job_key}/apply")))
        .json(&TriggerApplyRequest::default())
        .send()
        .await
        .expect("second trigger failed")
        .json()
        .await
        .expect("failed to parse second response");

    assert_eq!(first.session_id, second.session_id);
    assert_eq!(second.status, "already_in_progress");
}
