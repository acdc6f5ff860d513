//! Resume-tailor and cover-letter trigger handlers.
//!
//! Grounded on `examples/original_source/webapp/app.py`'s
//! `tailor_resume_endpoint` (lines ~331-377) and `cover_letter_endpoint`
//! (lines ~496-542): resolve the source resume path, double-click guard via
//! the pipeline's own Session Registry, then start the background pipeline.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use tracing::instrument;

use crate::handlers::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PipelineSessionResponse {
    pub session_id: String,
    pub job_key: String,
    pub status: &'static str,
}

/// POST /jobs/:job_key/tailor-resume
#[instrument(skip(state), fields(job_key = %job_key))]
pub async fn trigger_tailor_resume(
    State(state): State<AppState>,
    Path(job_key): Path<String>,
) -> ApiResult<Json<PipelineSessionResponse>> {
    if let Some(existing) = state.resume_pipeline.subscribe(&job_key) {
        return Ok(Json(PipelineSessionResponse {
            session_id: existing.id.as_str().to_string(),
            job_key,
            status: "already_in_progress",
        }));
    }

    let session = state
        .resume_pipeline
        .start(&job_key, state.default_resume_path.clone())
        .await?;
    Ok(Json(PipelineSessionResponse {
        session_id: session.id.as_str().to_string(),
        job_key,
        status: "started",
    }))
}

/// POST /jobs/:job_key/cover-letter
#[instrument(skip(state), fields(job_key = %job_key))]
pub async fn trigger_cover_letter(
    State(state): State<AppState>,
    Path(job_key): Path<String>,
) -> ApiResult<Json<PipelineSessionResponse>> {
    if let Some(existing) = state.cover_pipeline.subscribe(&job_key) {
        return Ok(Json(PipelineSessionResponse {
            session_id: existing.id.as_str().to_string(),
            job_key,
            status: "already_in_progress",
        }));
    }

    let session = state
        .cover_pipeline
        .start(&job_key, state.default_resume_path.clone())
        .await?;
    Ok(Json(PipelineSessionResponse {
        session_id: session.id.as_str().to_string(),
        job_key,
        status: "started",
    }))
}
