//! Server-Sent Events adapter for the apply, resume-tailor, and cover-letter
//! Sessions.
//!
//! Grounded on `examples/original_source/webapp/app.py`'s `apply_stream` /
//! `resume_tailor_stream` / `cover_letter_stream`: 15-second
//! `asyncio.wait_for`-style keepalive that falls back to a `ping` event on
//! timeout, and closing the stream once a `done` event is drained. The
//! original renders each event through a Jinja partial before writing it to
//! the wire; no templating crate is present anywhere in the retrieved
//! corpus, and SPEC_FULL.md §9 flags exactly this coupling as a redesign
//! target ("the Stream Adapter treats bodies as opaque bytes"), so this
//! adapter instead serializes the structured `Event` as the SSE `data`
//! field and lets whatever client is listening render its own fragment.
//!
//! Client disconnects are handled by axum itself: once the peer goes away,
//! the response body stream stops being polled and is dropped, which ends
//! the loop below without any explicit `is_disconnected()` check.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use apply_adapters::Session;
use axum::extract::{Path, State};
use axum::response::sse::{Event as SseEvent, Sse};
use tokio_stream::Stream;
use tracing::instrument;

use crate::handlers::ApiError;
use crate::state::AppState;

fn event_stream(
    session: Arc<Session>,
    keepalive_interval: Duration,
) -> impl Stream<Item = Result<SseEvent, Infallible>> {
    async_stream::stream! {
        loop {
            match tokio::time::timeout(keepalive_interval, session.next_event()).await {
                Ok(Some(event)) => {
                    let is_terminal = event.event_type.is_terminal();
                    let data = serde_json::to_string(&event).unwrap_or_default();
                    yield Ok(SseEvent::default().event(event.event_type.as_str()).data(data));
                    if is_terminal {
                        break;
                    }
                }
                Ok(None) => break,
                Err(_elapsed) => {
                    yield Ok(SseEvent::default().event("ping").data(""));
                }
            }
        }
    }
}

/// GET /jobs/:job_key/apply/stream
#[instrument(skip(state), fields(job_key = %job_key))]
pub async fn apply_stream(
    State(state): State<AppState>,
    Path(job_key): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let session = state
        .orchestrator
        .subscribe(&job_key)
        .ok_or_else(|| ApiError::NotFound {
            resource: "apply session".to_string(),
            id: job_key,
        })?;
    Ok(Sse::new(event_stream(session, state.keepalive_interval)))
}

/// GET /jobs/:job_key/tailor-resume/stream
#[instrument(skip(state), fields(job_key = %job_key))]
pub async fn resume_stream(
    State(state): State<AppState>,
    Path(job_key): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let session = state
        .resume_pipeline
        .subscribe(&job_key)
        .ok_or_else(|| ApiError::NotFound {
            resource: "resume tailor session".to_string(),
            id: job_key,
        })?;
    Ok(Sse::new(event_stream(session, state.keepalive_interval)))
}

/// GET /jobs/:job_key/cover-letter/stream
#[instrument(skip(state), fields(job_key = %job_key))]
pub async fn cover_letter_stream(
    State(state): State<AppState>,
    Path(job_key): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let session = state
        .cover_pipeline
        .subscribe(&job_key)
        .ok_or_else(|| ApiError::NotFound {
            resource: "cover letter session".to_string(),
            id: job_key,
        })?;
    Ok(Sse::new(event_stream(session, state.keepalive_interval)))
}
