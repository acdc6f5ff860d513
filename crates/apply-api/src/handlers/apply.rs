//! Apply trigger/confirm/cancel handlers.
//!
//! Grounded on `examples/original_source/webapp/app.py::trigger_apply`,
//! `::apply_confirm`, `::apply_cancel`, and the request/response/`ApiError`
//! pattern of the teacher's `handlers/approvals.rs`. The original renders an
//! HTML fragment establishing an SSE connection; this API instead returns a
//! small JSON body naming the session, leaving fragment rendering to
//! whatever transport layer consumes it (SPEC_FULL.md §9).

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use apply_domain::entities::ApplyMode;

use crate::handlers::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct TriggerApplyRequest {
    pub mode: Option<ApplyMode>,
}

#[derive(Debug, Serialize)]
pub struct ApplySessionResponse {
    pub session_id: String,
    pub job_key: String,
    pub status: &'static str,
}

/// POST /jobs/:job_key/apply
#[instrument(skip(state, body), fields(job_key = %job_key))]
pub async fn trigger_apply(
    State(state): State<AppState>,
    Path(job_key): Path<String>,
    Json(body): Json<TriggerApplyRequest>,
) -> ApiResult<Json<ApplySessionResponse>> {
    if let Some(existing) = state.orchestrator.subscribe(&job_key) {
        return Ok(Json(ApplySessionResponse {
            session_id: existing.id.as_str().to_string(),
            job_key,
            status: "already_in_progress",
        }));
    }

    let mode = body.mode.unwrap_or_default();
    let session = state.orchestrator.start(&job_key, mode).await?;
    Ok(Json(ApplySessionResponse {
        session_id: session.id.as_str().to_string(),
        job_key,
        status: "started",
    }))
}

/// POST /jobs/:job_key/apply/confirm
#[instrument(skip(state), fields(job_key = %job_key))]
pub async fn confirm_apply(
    State(state): State<AppState>,
    Path(job_key): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.orchestrator.confirm(&job_key)?;
    Ok(Json(serde_json::json!({ "status": "confirmed" })))
}

/// POST /jobs/:job_key/apply/cancel
#[instrument(skip(state), fields(job_key = %job_key))]
pub async fn cancel_apply(
    State(state): State<AppState>,
    Path(job_key): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.orchestrator.cancel(&job_key)?;
    Ok(Json(serde_json::json!({ "status": "cancelled" })))
}
