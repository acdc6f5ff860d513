//! Resume-tailor pipeline end-to-end test against a running `apply-api`
//! server (scenario 5: resume tailoring with fabrication, §8).
//!
//! The fabrication-detection branch itself (`validate_no_fabrication`) and
//! the pipeline's handling of a failing validation are exhaustively unit
//! tested against fake ports in `validator.rs` and `pipelines.rs`; this test
//! only checks that the HTTP/SSE surface carries a tailoring run through to
//! completion and reports the outcome in the terminal `done` event's
//! message, whichever way the (real) generator's output validates.
//!
//! Requires:
//! - A running `apply-api` at APPLY_API_URL (default: http://localhost:8000)
//! - APPLY_TEST_JOB_KEY: job_key for an existing job row
//! - A reachable `claude` CLI binary and a resume file at the server's
//!   configured default resume path

use serde::Deserialize;
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

#[derive(Debug, Deserialize)]
struct PipelineSessionResponse {
    #[allow(dead_code)]
    session_id: String,
    job_key: String,
    status: String,
}

fn job_key_env() -> String {
    std::env::var("APPLY_TEST_JOB_KEY").unwrap_or_else(|_| panic!("APPLY_TEST_JOB_KEY must be set"))
}

/// Triggering resume tailoring runs extract → generate → validate → render
/// → persist and terminates the stream with a `done` event.
#[tokio::test]
#[ignore] // requires a running apply-api server, a seeded job row, and a claude CLI
async fn test_tailor_resume_runs_to_completion() {
    let client = TestClient::new();
    let job_key = job_key_env();

    let trigger: PipelineSessionResponse = client
        .http
        .post(client.url(&format!("/jobs/{job_key}/tailor-resume")))
        .json(&serde_json::json!({}))
        .send()
        .await
        .expect("trigger tailor-resume failed")
        .json()
        .await
        .expect("failed to parse trigger response");
    assert_eq!(trigger.job_key, job_key);
    assert!(trigger.status == "started" || trigger.status == "already_in_progress");

    let stream_resp = client
        .http
        .get(client.url(&format!("/jobs/{job_key}/tailor-resume/stream")))
        .timeout(Duration::from_secs(120))
        .send()
        .await
        .expect("stream request failed");
    assert!(stream_resp.status().is_success());

    let body = stream_resp.text().await.expect("failed to read SSE body");
    assert!(
        body.contains("\"type\":\"done\"") || body.contains("event: done"),
        "expected the tailoring run to terminate with a done event: {body}"
    );

    // The done event's message reports fabrication-validation warnings when
    // the generator introduced unsupported claims, and a plain success
    // message otherwise; either is a valid terminal outcome here.
    assert!(
        body.contains("tailored") || body.contains("warning"),
        "expected the terminal message to describe the tailoring outcome: {body}"
    );
}

/// Triggering cover-letter generation for the same job runs the isomorphic
/// extract → generate → render → persist pipeline and also terminates with
/// a `done` event, independent of the resume-tailor Session above (separate
/// Session Registry, §4.5).
#[tokio::test]
#[ignore] // requires a running apply-api server, a seeded job row, and a claude CLI
async fn test_cover_letter_runs_to_completion() {
    let client = TestClient::new();
    let job_key = job_key_env();

    let trigger: PipelineSessionResponse = client
        .http
        .post(client.url(&format!("/jobs/{job_key}/cover-letter")))
        .json(&serde_json::json!({}))
        .send()
        .await
        .expect("trigger cover-letter failed")
        .json()
        .await
        .expect("failed to parse trigger response");
    assert_eq!(trigger.job_key, job_key);
    assert!(trigger.status == "started" || trigger.status == "already_in_progress");

    let stream_resp = client
        .http
        .get(client.url(&format!("/jobs/{job_key}/cover-letter/stream")))
        .timeout(Duration::from_secs(120))
        .send()
        .await
        .expect("stream request failed");
    assert!(stream_resp.status().is_success());

    let body = stream_resp.text().await.expect("failed to read SSE body");
    assert!(
        body.contains("\"type\":\"done\"") || body.contains("event: done"),
        "expected the cover letter run to terminate with a done event: {body}"
    );
}
